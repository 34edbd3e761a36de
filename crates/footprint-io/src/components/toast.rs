//! Transient notification.

use dioxus::prelude::*;

use crate::state::{NoticeKind, use_map};

/// Shows the current notice until it times out or is dismissed.
#[component]
pub fn Toast() -> Element {
    let ctx = use_map();
    let Some(notice) = (ctx.notice)() else {
        return rsx! {};
    };
    let kind = match notice.kind {
        NoticeKind::Info => "toast-info",
        NoticeKind::Error => "toast-error",
    };

    rsx! {
        div { class: "toast {kind}", role: "alert",
            span { "{notice.message}" }
            button {
                class: "toast-close",
                aria_label: "Dismiss",
                onclick: move |_| ctx.dismiss(),
                "×"
            }
        }
    }
}
