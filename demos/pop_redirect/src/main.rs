use std::rc::Rc;

use backstack_core::{Dispose, Size, View};
use backstack_navigation::animation::{
    fade_enter, fade_exit, horizontal_enter, horizontal_exit, horizontal_pop_enter,
    horizontal_pop_exit,
};
use backstack_navigation::*;
use web_time::Duration;

const FRAME: Duration = Duration::from_millis(16);

fn screen(label: &str) -> View {
    let view = View::new(label);
    view.set_size(Size::new(360.0, 640.0));
    view
}

fn animated_container(label: &str) -> Rc<NavigationContainer> {
    let params = AnimationParams::builder()
        .duration(Duration::from_millis(120))
        .add_animations(
            horizontal_enter(),
            horizontal_exit(),
            horizontal_pop_enter(),
            horizontal_pop_exit(),
        )
        .add_animations(fade_enter(), fade_exit(), fade_enter(), fade_exit())
        .build();
    let container = Rc::new(NavigationContainer::new(label).with_animation_params(params));
    container.container().set_size(Size::new(360.0, 640.0));
    container
}

/// Runs frames until the running transition settles.
fn settle(container: &NavigationContainer) {
    let mut frames = 0;
    while container.on_frame() {
        frames += 1;
        std::thread::sleep(FRAME);
    }
    if frames > 0 {
        log::debug!("transition settled after {frames} frames");
    }
}

fn report(nav: &ViewNavigator) {
    let routes: Vec<String> = nav.routes().iter().map(Route::to_string).collect();
    log::info!("[{}] stack: {}", nav.name(), routes.join(" > "));
}

/// Child navigator whose last pop is handed to `parent`.
fn build_inner(
    parent: NavController,
    container: Rc<NavigationContainer>,
) -> Result<(ViewNavigator, Dispose)> {
    let inner = ViewNavigator::builder("settings", "general")
        .container(container)
        .build(|scope| {
            scope.nav_view("general", true, ViewHooks::new(), |_, _| screen("general"));
            scope.nav_view("privacy", true, ViewHooks::new(), |_, _| screen("privacy"));
        })?;
    let pop_out = inner.add_on_pop_out_listener(move || match parent.pop(false) {
        Ok(handled) => handled,
        Err(e) => {
            log::error!("parent pop failed: {e}");
            false
        }
    });
    Ok((inner, pop_out))
}

fn build_main(
    store: Rc<SavedStateStore>,
    container: Rc<NavigationContainer>,
    controller: NavController,
    nested: View,
) -> Result<ViewNavigator> {
    ViewNavigator::builder("main", "one")
        .controller(controller)
        .container(container)
        .saved_state(store)
        .build(move |scope| {
            scope.nav_view("one", true, ViewHooks::new(), |_, _| screen("one"));
            scope.nav_view("two", false, ViewHooks::new(), |_, entry| {
                let id = entry.with_args(|a| a.and_then(|a| a.get_int("id")));
                log::info!("building two for id {id:?}");
                screen("two")
            });
            let back_home = ViewHooks::<View>::new()
                .on_attach(|_, _, entry| {
                    let token = entry.scope().token();
                    entry.scope().on_cancel(move || {
                        log::info!("three: work cancelled ({})", token.is_cancelled());
                    });
                })
                .on_pop(|_, target| {
                    log::info!("three: pop toward {target:?} redirected to one");
                    PopResult::redirect("one")
                });
            scope.nav_view("three", true, back_home, |_, _| screen("three"));
            scope.nav_view("settings", true, ViewHooks::new(), move |_, _| {
                nested.clone()
            });
        })
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    log::info!("Starting pop redirect demo");

    let store = Rc::new(SavedStateStore::new());
    let container = animated_container("main");
    container.container().attach_to_window();
    let settings_container = animated_container("settings");
    let controller = NavController::new();

    let (settings, _pop_out) = build_inner(controller.clone(), settings_container.clone())?;
    let nav = build_main(
        store.clone(),
        container.clone(),
        controller.clone(),
        settings.container_view(),
    )?;
    let _changes = nav.add_route_change_listener(|prev, next| {
        log::info!("route changed: {prev:?} -> {next}");
    });

    controller.navigate_to("two", Some(Bundle::new().with("id", 42_i64)))?;
    settle(&container);
    controller.navigate_to("three", None)?;
    settle(&container);
    report(&nav);

    // three redirects its pop straight back to one
    controller.pop(false)?;
    settle(&container);
    report(&nav);

    controller.navigate_to("settings", None)?;
    settle(&container);
    settings.navigate_to("privacy", None)?;
    settle(&settings_container);
    report(&settings);
    settings.pop(false)?;
    settle(&settings_container);
    settings.pop(false)?;
    settle(&container);
    report(&nav);

    controller.navigate_to("two", Some(Bundle::new().with("id", 7_i64)))?;
    settle(&container);
    let saved = store.to_json()?;
    log::info!("saved state: {saved}");

    drop(nav);
    drop(settings);
    container.container().detach_from_window();

    let restored = Rc::new(SavedStateStore::from_json(&saved)?);
    let container = animated_container("main");
    container.container().attach_to_window();
    let controller = NavController::new();
    let (settings, _pop_out) = build_inner(controller.clone(), animated_container("settings"))?;
    let nav = build_main(restored, container, controller, settings.container_view())?;
    report(&nav);
    if let Some(entry) = nav.entry("two", 1) {
        log::info!("restored args of two: {:?}", entry.args());
    }
    Ok(())
}
