use std::time::{Duration, Instant};

use egui::{Align2, Context, Frame, RichText};

use super::theme;
use crate::store::{Notice, NoticeKind};

const TOAST_LIFETIME: Duration = Duration::from_secs(6);
const MAX_TOASTS: usize = 5;

struct Toast {
    notice: Notice,
    shown_at: Instant,
}

/// Transient messages stacked in the bottom-right corner.
#[derive(Default)]
pub struct Toasts {
    toasts: Vec<Toast>,
}

impl Toasts {
    pub fn push(&mut self, notice: Notice) {
        self.toasts.push(Toast {
            notice,
            shown_at: Instant::now(),
        });
        if self.toasts.len() > MAX_TOASTS {
            self.toasts.remove(0);
        }
    }

    pub fn show(&mut self, ctx: &Context) {
        self.toasts.retain(|t| t.shown_at.elapsed() < TOAST_LIFETIME);
        if self.toasts.is_empty() {
            return;
        }

        let mut dismissed = None;
        egui::Area::new(egui::Id::new("toasts"))
            .anchor(Align2::RIGHT_BOTTOM, [-12.0, -36.0])
            .order(egui::Order::Foreground)
            .show(ctx, |ui| {
                for (idx, toast) in self.toasts.iter().enumerate() {
                    let fill = match toast.notice.kind {
                        NoticeKind::SaveFailed => theme::TOAST_ERROR,
                        NoticeKind::ItemRemoved => theme::TOAST_INFO,
                    };
                    let response = Frame::popup(ui.style())
                        .fill(fill)
                        .show(ui, |ui| {
                            ui.set_max_width(320.0);
                            ui.label(RichText::new(&toast.notice.message).color(theme::TEXT_ON_BAR));
                        })
                        .response;
                    if response.interact(egui::Sense::click()).clicked() {
                        dismissed = Some(idx);
                    }
                    ui.add_space(4.0);
                }
            });
        if let Some(idx) = dismissed {
            self.toasts.remove(idx);
        }

        // Expire the oldest toast even when nothing else repaints.
        if let Some(oldest) = self.toasts.first() {
            ctx.request_repaint_after(TOAST_LIFETIME.saturating_sub(oldest.shown_at.elapsed()));
        }
    }
}
