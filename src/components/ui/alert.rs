use leptos::prelude::*;
use leptos_ui::clx;

mod components {
    use super::*;
    clx! {Alert, div, "relative w-full rounded-lg border px-4 py-3 text-sm"}
    clx! {AlertDescription, p, "text-sm whitespace-pre-wrap [&_p]:leading-relaxed"}
}

pub use components::*;

/// Inline alert for a remote failure; renders nothing while `error` is `None`.
#[component]
pub fn ErrorAlert(#[prop(into)] error: Signal<Option<String>>) -> impl IntoView {
    move || {
        error.get().map(|e| {
            view! {
                <Alert class="border-destructive/30">
                    <AlertDescription class="text-destructive text-xs">{e}</AlertDescription>
                </Alert>
            }
        })
    }
}

/// Neutral status line, e.g. an import summary.
#[component]
pub fn NoticeAlert(#[prop(into)] message: Signal<Option<String>>) -> impl IntoView {
    move || {
        message.get().map(|m| {
            view! {
                <Alert class="border-emerald-600/30 bg-emerald-50/50">
                    <AlertDescription class="text-xs">{m}</AlertDescription>
                </Alert>
            }
        })
    }
}
