//! Pannable, zoomable surface that hosts the note trees of one garden.

use crate::components::ui::{Button, ButtonSize, ButtonVariant};
use crate::editor::{GardenUi, MindTreeNode};
use crate::models::{MindNode, Point};
use crate::state::{actions, AppContext, Autosave};
use crate::viewport::{wheel_delta_px, Viewport, ZoomCurve};
use leptos::ev;
use leptos::html;
use leptos::prelude::*;
use leptos::task::spawn_local;
use leptos_dom::helpers::window_event_listener;

const VIEW_SAVE_DELAY_MS: u32 = 800;
const ZOOM_STEP: f64 = 1.2;

/// Screen point of an event relative to the canvas element.
fn local_point(el: &web_sys::HtmlDivElement, client_x: f64, client_y: f64) -> Point {
    let rect = el.get_bounding_client_rect();
    Point::new(client_x - rect.left(), client_y - rect.top())
}

fn touch_points(el: &web_sys::HtmlDivElement, list: &web_sys::TouchList) -> Vec<Point> {
    (0..list.length())
        .filter_map(|i| list.get(i))
        .map(|t| local_point(el, t.client_x() as f64, t.client_y() as f64))
        .collect()
}

#[component]
pub fn GardenCanvas() -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let ui = expect_context::<GardenUi>();
    let app = app_state.0;

    let initial = app
        .garden
        .with_untracked(|g| g.as_ref().map(|g| g.view))
        .unwrap_or_default();
    let viewport = RwSignal::new(Viewport::new(initial, ZoomCurve::default()));
    let canvas_ref: NodeRef<html::Div> = NodeRef::new();

    let view_saver = Autosave::new(VIEW_SAVE_DELAY_MS);
    let persist_view = {
        let view_saver = view_saver.clone();
        move || {
            let view = viewport.with_untracked(|v| v.view());
            view_saver.schedule(move || {
                spawn_local(async move {
                    if let Err(e) = actions::save_view(app, view).await {
                        ui.error.set(Some(e));
                    }
                });
            });
        }
    };
    let persist_view = StoredValue::new(persist_view);

    {
        let view_saver = view_saver.clone();
        on_cleanup(move || view_saver.cancel());
    }

    // Follow view changes made outside the canvas, e.g. a rolled-back save.
    let stored_view = Memo::new(move |_| app.garden.with(|g| g.as_ref().map(|g| g.view)));
    Effect::new(move |_| {
        let Some(view) = stored_view.get() else {
            return;
        };
        viewport.update(|v| {
            if v.is_idle() && v.view() != view {
                v.restore(view);
            }
        });
    });

    let on_mousedown = move |ev: web_sys::MouseEvent| {
        if ev.button() != 0 {
            return;
        }
        let Some(el) = canvas_ref.get_untracked() else {
            return;
        };
        let p = local_point(&el, ev.client_x() as f64, ev.client_y() as f64);
        viewport.update(|v| v.pointer_down(p));
    };

    let on_mousemove = move |ev: web_sys::MouseEvent| {
        if viewport.with_untracked(|v| v.is_idle()) {
            return;
        }
        let Some(el) = canvas_ref.get_untracked() else {
            return;
        };
        let p = local_point(&el, ev.client_x() as f64, ev.client_y() as f64);
        viewport.update(|v| {
            v.pointer_move(p);
        });
    };

    let mouseup_handle = window_event_listener(ev::mouseup, move |_| {
        if viewport.with_untracked(|v| v.is_idle()) {
            return;
        }
        viewport.update(|v| v.pointer_up());
        persist_view.with_value(|f| f());
    });
    on_cleanup(move || mouseup_handle.remove());

    let on_wheel = move |ev: web_sys::WheelEvent| {
        ev.prevent_default();
        let Some(el) = canvas_ref.get_untracked() else {
            return;
        };
        let p = local_point(&el, ev.client_x() as f64, ev.client_y() as f64);
        let page = el.get_bounding_client_rect().height();
        let delta = wheel_delta_px(ev.delta_y(), ev.delta_mode(), page);
        viewport.update(|v| v.wheel(p, delta));
        persist_view.with_value(|f| f());
    };

    let on_touchstart = move |ev: web_sys::TouchEvent| {
        let Some(el) = canvas_ref.get_untracked() else {
            return;
        };
        let points = touch_points(&el, &ev.touches());
        viewport.update(|v| v.touch_start(&points));
    };

    let on_touchmove = move |ev: web_sys::TouchEvent| {
        let Some(el) = canvas_ref.get_untracked() else {
            return;
        };
        let points = touch_points(&el, &ev.touches());
        let moved = viewport.try_update(|v| v.touch_move(&points)).unwrap_or(false);
        if moved {
            ev.prevent_default();
        }
    };

    let on_touchend = move |ev: web_sys::TouchEvent| {
        let Some(el) = canvas_ref.get_untracked() else {
            return;
        };
        let remaining = touch_points(&el, &ev.touches());
        viewport.update(|v| v.touch_end(&remaining));
        if remaining.is_empty() {
            persist_view.with_value(|f| f());
        }
    };

    let on_dblclick = move |ev: web_sys::MouseEvent| {
        let Some(el) = canvas_ref.get_untracked() else {
            return;
        };
        let p = local_point(&el, ev.client_x() as f64, ev.client_y() as f64);
        let world = viewport.with_untracked(|v| v.screen_to_world(p));
        spawn_local(async move {
            match actions::create_root(app, "New note".to_string(), world).await {
                Ok(Some(row)) => ui.selected.set(Some(row.id)),
                Ok(None) => {}
                Err(e) => ui.error.set(Some(e)),
            }
        });
    };

    let zoom_by = move |factor: f64| {
        let center = canvas_ref
            .get_untracked()
            .map(|el| {
                let rect = el.get_bounding_client_rect();
                Point::new(rect.width() / 2.0, rect.height() / 2.0)
            })
            .unwrap_or_default();
        viewport.update(|v| v.zoom_at(center, factor));
        persist_view.with_value(|f| f());
    };

    let roots = move || {
        app.garden.with(|g| {
            g.as_ref()
                .map(|g| {
                    g.forest()
                        .trees()
                        .iter()
                        .map(|t| {
                            let pos = g
                                .row(&t.id)
                                .map(|r| Point::new(r.position_x, r.position_y))
                                .unwrap_or_default();
                            (t.clone(), pos)
                        })
                        .collect::<Vec<(MindNode, Point)>>()
                })
                .unwrap_or_default()
        })
    };

    view! {
        <div class="relative h-full w-full overflow-hidden bg-[radial-gradient(#d1d5db_1px,transparent_1px)] [background-size:24px_24px]">
            <div
                node_ref=canvas_ref
                class="absolute inset-0 cursor-grab active:cursor-grabbing touch-none"
                on:mousedown=on_mousedown
                on:mousemove=on_mousemove
                on:wheel=on_wheel
                on:touchstart=on_touchstart
                on:touchmove=on_touchmove
                on:touchend=on_touchend
                on:touchcancel=on_touchend
                on:dblclick=on_dblclick
            >
                <div
                    class="absolute left-0 top-0 origin-top-left"
                    style:transform=move || viewport.with(|v| v.css_transform())
                >
                    {move || {
                        roots()
                            .into_iter()
                            .map(|(node, pos)| {
                                view! {
                                    <div
                                        class="absolute"
                                        style:left=format!("{}px", pos.x)
                                        style:top=format!("{}px", pos.y)
                                    >
                                        <MindTreeNode node=node />
                                    </div>
                                }
                            })
                            .collect_view()
                    }}
                </div>
            </div>

            <div class="absolute bottom-4 right-4 flex items-center gap-1 rounded-lg border bg-white/90 p-1 shadow-sm">
                <Button variant=ButtonVariant::Ghost size=ButtonSize::Icon on:click=move |_| zoom_by(1.0 / ZOOM_STEP) attr:title="Zoom out">
                    "−"
                </Button>
                <span class="w-12 text-center text-xs tabular-nums text-muted-foreground">
                    {move || format!("{:.0}%", viewport.with(|v| v.view().scale) * 100.0)}
                </span>
                <Button variant=ButtonVariant::Ghost size=ButtonSize::Icon on:click=move |_| zoom_by(ZOOM_STEP) attr:title="Zoom in">
                    "+"
                </Button>
                <Button
                    variant=ButtonVariant::Ghost
                    size=ButtonSize::Xs
                    on:click=move |_| {
                        viewport.update(|v| v.reset());
                        persist_view.with_value(|f| f());
                    }
                >
                    "Reset"
                </Button>
            </div>

            <div class="pointer-events-none absolute bottom-4 left-4 text-xs text-muted-foreground">
                "Drag to pan · scroll or pinch to zoom · double-click to add a note"
            </div>
        </div>
    }
}
