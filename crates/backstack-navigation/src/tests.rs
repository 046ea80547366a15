#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};
    use std::collections::HashMap;
    use std::rc::Rc;

    use backstack_core::animation::ManualClock;
    use backstack_core::{LayoutDirection, Size, View};
    use web_time::Duration;

    use crate::animation::{horizontal_enter, horizontal_pop_exit};
    use crate::*;

    type BuildCounts = Rc<RefCell<HashMap<String, usize>>>;

    struct Harness {
        nav: ViewNavigator,
        container: Rc<NavigationContainer>,
        builds: BuildCounts,
    }

    impl Harness {
        fn builds(&self, route: &str) -> usize {
            self.builds.borrow().get(route).copied().unwrap_or(0)
        }

        fn routes(&self) -> Vec<String> {
            self.nav
                .routes()
                .into_iter()
                .map(|r| r.as_str().to_owned())
                .collect()
        }
    }

    fn still_container(label: &str) -> Rc<NavigationContainer> {
        let container =
            Rc::new(NavigationContainer::new(label).with_animation_params(AnimationParams::none()));
        container.container().attach_to_window();
        container
    }

    fn counted_view(
        scope: &mut NavigatorScope,
        route: &'static str,
        cached: bool,
        hooks: ViewHooks<View>,
        builds: &BuildCounts,
    ) {
        let builds = builds.clone();
        scope.nav_view(route, cached, hooks, move |_, entry| {
            *builds.borrow_mut().entry(route.to_owned()).or_insert(0) += 1;
            View::new(format!("{route}_{}", entry.position()))
        });
    }

    fn harness(init: &str, routes: &[(&'static str, bool)]) -> Harness {
        let container = still_container("root");
        let builds: BuildCounts = Rc::default();
        let counter = builds.clone();
        let routes = routes.to_vec();
        let nav = ViewNavigator::builder("main", init)
            .container(container.clone())
            .build(move |scope| {
                for (route, cached) in routes {
                    counted_view(scope, route, cached, ViewHooks::new(), &counter);
                }
            })
            .unwrap();
        Harness {
            nav,
            container,
            builds,
        }
    }

    #[test]
    fn test_stack_grows_with_each_push() {
        let h = harness("a", &[("a", true), ("b", true), ("c", true)]);
        assert_eq!(h.nav.view_stack_size(), 1);

        assert!(h.nav.navigate_to("b", None).unwrap());
        assert!(h.nav.navigate_to("c", None).unwrap());

        assert_eq!(h.nav.view_stack_size(), 3);
        assert_eq!(h.routes(), ["a", "b", "c"]);
        assert_eq!(h.nav.current_route().unwrap(), "c");
        assert_eq!(h.container.container().child_count(), 1);
    }

    #[test]
    fn test_navigate_to_cached_front_is_noop() {
        let h = harness("a", &[("a", true)]);
        let before = h.nav.current_view().unwrap();

        assert!(!h.nav.navigate_to("a", None).unwrap());

        assert_eq!(h.nav.view_stack_size(), 1);
        assert!(h.nav.current_view().unwrap().ptr_eq(&before));
        assert_eq!(h.builds("a"), 1);
    }

    #[test]
    fn test_navigate_to_uncached_front_pushes_again() {
        let h = harness("a", &[("a", false)]);

        assert!(h.nav.navigate_to("a", None).unwrap());

        assert_eq!(h.nav.view_stack_size(), 2);
        assert_eq!(h.builds("a"), 2);
        let first = h.nav.entry("a", 0).unwrap();
        let second = h.nav.entry("a", 1).unwrap();
        assert!(!first.ptr_eq(&second));
    }

    #[test]
    fn test_cached_route_pushed_twice_gets_two_slots() {
        let h = harness("a", &[("a", true), ("b", true)]);
        h.nav.navigate_to("b", None).unwrap();
        h.nav.navigate_to("a", None).unwrap();

        assert_eq!(h.routes(), ["a", "b", "a"]);
        assert_eq!(h.builds("a"), 2);
    }

    #[test]
    fn test_pop_out_listeners_decide_last_pop() {
        let h = harness("a", &[("a", true)]);
        let asked = Rc::new(Cell::new(0));

        let counter = asked.clone();
        let refuse = h.nav.add_on_pop_out_listener(move || {
            counter.set(counter.get() + 1);
            false
        });
        assert!(!h.nav.pop(false).unwrap());
        assert_eq!(asked.get(), 1);
        assert_eq!(h.nav.view_stack_size(), 1);

        let _accept = h.nav.add_on_pop_out_listener(|| true);
        assert!(h.nav.pop(false).unwrap());
        assert_eq!(h.nav.view_stack_size(), 1);

        refuse.run();
        assert!(h.nav.pop(true).unwrap());
        assert_eq!(asked.get(), 2);
    }

    #[test]
    fn test_pop_to_absent_route_returns_false() {
        let h = harness("a", &[("a", true), ("b", true), ("c", true)]);
        h.nav.navigate_to("b", None).unwrap();

        assert!(!h.nav.pop_to("c", false, None).unwrap());
        assert_eq!(h.routes(), ["a", "b"]);

        // the front activation is not a pop target
        assert!(!h.nav.pop_to("b", true, None).unwrap());
        assert_eq!(h.routes(), ["a", "b"]);
    }

    #[test]
    fn test_pop_to_targets_nearest_occurrence() {
        let h = harness("a", &[("a", true), ("b", true), ("c", true)]);
        h.nav.navigate_to("b", None).unwrap();
        h.nav.navigate_to("a", None).unwrap();
        h.nav.navigate_to("c", None).unwrap();
        assert_eq!(h.routes(), ["a", "b", "a", "c"]);

        assert!(h.nav.pop_to("a", false, None).unwrap());

        assert_eq!(h.routes(), ["a", "b", "a"]);
        let shown = h.nav.current_view().unwrap();
        assert_eq!(shown.label(), "a_2");
    }

    #[test]
    fn test_unknown_route_is_an_error() {
        let h = harness("a", &[("a", true)]);

        let err = h.nav.navigate_to("ghost", None).unwrap_err();
        assert!(matches!(err, NavError::UnknownRoute(ref r) if r == "ghost"));
        assert!(matches!(
            h.nav.pop_to("ghost", false, None),
            Err(NavError::UnknownRoute(_))
        ));

        let built = ViewNavigator::builder("other", "nowhere").build(|scope| {
            scope.nav_view("a", true, ViewHooks::new(), |_, _| View::new("a"));
        });
        assert!(matches!(built, Err(NavError::UnknownRoute(ref r)) if r == "nowhere"));
    }

    fn redirecting(target: &'static str) -> ViewHooks<View> {
        ViewHooks::<View>::new().on_pop(move |_, _| PopResult::redirect(target))
    }

    #[test]
    fn test_redirect_pops_to_target() {
        let container = still_container("root");
        let builds: BuildCounts = Rc::default();
        let nav = ViewNavigator::builder("main", "one")
            .container(container)
            .build(|scope| {
                counted_view(scope, "one", true, ViewHooks::new(), &builds);
                counted_view(scope, "two", true, ViewHooks::new(), &builds);
                counted_view(scope, "three", true, redirecting("one"), &builds);
            })
            .unwrap();
        nav.navigate_to("two", None).unwrap();
        nav.navigate_to("three", None).unwrap();

        assert!(nav.pop(false).unwrap());

        assert_eq!(nav.routes(), [Route::from("one")]);
    }

    #[test]
    fn test_intercept_keeps_stack_unless_forced() {
        let container = still_container("root");
        let builds: BuildCounts = Rc::default();
        let nav = ViewNavigator::builder("main", "a")
            .container(container)
            .build(|scope| {
                counted_view(scope, "a", true, ViewHooks::new(), &builds);
                let hooks = ViewHooks::<View>::new().on_pop(|_, _| PopResult::Intercept);
                counted_view(scope, "b", true, hooks, &builds);
            })
            .unwrap();
        nav.navigate_to("b", None).unwrap();

        assert!(nav.pop(false).unwrap());
        assert_eq!(nav.view_stack_size(), 2);

        assert!(nav.pop(true).unwrap());
        assert_eq!(nav.view_stack_size(), 1);
    }

    #[test]
    fn test_screen_handler_runs_before_default() {
        let container = still_container("root");
        let builds: BuildCounts = Rc::default();
        let nav = ViewNavigator::builder("main", "a")
            .container(container)
            .build(|scope| {
                counted_view(scope, "a", true, ViewHooks::new(), &builds);
                counted_view(scope, "b", true, ViewHooks::new(), &builds);
                counted_view(scope, "c", true, redirecting("a"), &builds);
            })
            .unwrap();
        let targets = Rc::new(RefCell::new(Vec::new()));
        let seen = targets.clone();
        nav.set_default_pop_handler(move |target| {
            seen.borrow_mut().push(target.cloned());
            PopResult::Intercept
        });

        nav.navigate_to("b", None).unwrap();
        assert!(nav.pop(false).unwrap());
        assert_eq!(nav.view_stack_size(), 2);
        assert_eq!(*targets.borrow(), [Some(Route::from("a"))]);

        nav.navigate_to("c", None).unwrap();
        assert!(nav.pop(false).unwrap());
        assert_eq!(nav.routes(), [Route::from("a")]);
        assert_eq!(targets.borrow().len(), 1);

        assert!(nav.pop(false).unwrap());
        assert_eq!(targets.borrow().last().unwrap(), &None);

        nav.clear_default_pop_handler();
        assert!(!nav.pop(false).unwrap());
    }

    #[test]
    fn test_default_handler_redirects() {
        let container = still_container("root");
        let builds: BuildCounts = Rc::default();
        let nav = ViewNavigator::builder("main", "home")
            .container(container)
            .build(|scope| {
                counted_view(scope, "home", true, ViewHooks::new(), &builds);
                counted_view(scope, "a", true, ViewHooks::new(), &builds);
                counted_view(scope, "b", true, ViewHooks::new(), &builds);
            })
            .unwrap();
        let popped_out = Rc::new(Cell::new(false));
        let flag = popped_out.clone();
        let _pop_out = nav.add_on_pop_out_listener(move || {
            flag.set(true);
            true
        });
        nav.set_default_pop_handler(|_| PopResult::redirect("home"));

        nav.navigate_to("a", None).unwrap();
        nav.navigate_to("b", None).unwrap();
        assert!(nav.pop(false).unwrap());
        assert_eq!(nav.routes(), [Route::from("home")]);
        assert_eq!(nav.current_view().unwrap().label(), "home_0");

        // home is already in front, so the redirect never pops out
        assert!(!nav.pop(false).unwrap());
        assert_eq!(nav.view_stack_size(), 1);
        assert!(!popped_out.get());

        assert!(nav.pop(true).unwrap());
        assert!(popped_out.get());
    }

    #[test]
    fn test_pop_to_redirect_forwards_args() {
        let builds: BuildCounts = Rc::default();
        let nav = ViewNavigator::builder("main", "a")
            .container(still_container("root"))
            .build(|scope| {
                counted_view(scope, "a", true, ViewHooks::new(), &builds);
                counted_view(scope, "b", true, ViewHooks::new(), &builds);
                counted_view(scope, "c", true, redirecting("a"), &builds);
            })
            .unwrap();
        nav.navigate_to("b", None).unwrap();
        nav.navigate_to("c", None).unwrap();

        let args = Bundle::new().with("x", 1_i64);
        assert!(nav.pop_to("b", false, Some(args.clone())).unwrap());

        assert_eq!(nav.routes(), [Route::from("a")]);
        assert_eq!(nav.entry("a", 0).unwrap().args(), Some(args));
        assert_eq!(nav.entry("b", 1).unwrap().args(), None);
        assert_eq!(builds.borrow()["a"], 1);
    }

    #[test]
    fn test_pop_to_interception() {
        let container = still_container("root");
        let builds: BuildCounts = Rc::default();
        let nav = ViewNavigator::builder("main", "a")
            .container(container)
            .build(|scope| {
                counted_view(scope, "a", true, ViewHooks::new(), &builds);
                counted_view(scope, "b", true, ViewHooks::new(), &builds);
                let hooks = ViewHooks::<View>::new().on_pop(|_, target| match target {
                    Some(r) if r == "a" => PopResult::Intercept,
                    _ => PopResult::DoNothing,
                });
                counted_view(scope, "c", true, hooks, &builds);
            })
            .unwrap();
        nav.navigate_to("b", None).unwrap();
        nav.navigate_to("c", None).unwrap();

        assert!(nav.pop_to("a", false, None).unwrap());
        assert_eq!(nav.view_stack_size(), 3);

        assert!(nav.pop_to("a", true, None).unwrap());
        assert_eq!(nav.view_stack_size(), 1);
    }

    #[test]
    fn test_saved_stack_round_trip() {
        let store = Rc::new(SavedStateStore::new());
        let build = |store: Rc<SavedStateStore>| {
            ViewNavigator::builder("main", "home")
                .container(still_container("root"))
                .saved_state(store)
                .build(|scope| {
                    scope.nav_view("home", true, ViewHooks::new(), |_, _| View::new("home"));
                    scope.nav_view("detail", false, ViewHooks::new(), |_, _| {
                        View::new("detail")
                    });
                })
        };

        let nav = build(store.clone()).unwrap();
        nav.navigate_to("detail", Some(Bundle::new().with("k", "v")))
            .unwrap();

        let saved = store.save_all();
        let main = saved.get_bundle("main").unwrap();
        insta::assert_snapshot!(
            serde_json::to_string(main).unwrap(),
            @r#"{"stack":{"str_array":["home","detail"]},"detail_1":{"bundle":{"k":{"str":"v"}}}}"#
        );

        let text = store.to_json().unwrap();
        drop(nav);
        drop(store);

        let restored = Rc::new(SavedStateStore::from_json(&text).unwrap());
        let nav = build(restored.clone()).unwrap();

        assert_eq!(nav.routes(), [Route::from("home"), Route::from("detail")]);
        assert_eq!(nav.current_view().unwrap().label(), "detail");
        assert_eq!(nav.entry("home", 0).unwrap().args(), None);
        let args = nav.entry("detail", 1).unwrap().args().unwrap();
        assert_eq!(args.get_string("k"), Some("v"));

        // restored state is handed out once
        assert!(restored.consume_restored_state("main").is_none());
    }

    #[test]
    fn test_malformed_saved_state_is_rejected() {
        let broken = SavedStateStore::restored(
            Bundle::new().with("main", Bundle::new().with("stack", "home")),
        );
        let built = ViewNavigator::builder("main", "home")
            .saved_state(Rc::new(broken))
            .build(|scope| {
                scope.nav_view("home", true, ViewHooks::new(), |_, _| View::new("home"));
            });
        assert!(matches!(built, Err(NavError::MalformedState { ref name, .. }) if name == "main"));

        let stale = SavedStateStore::restored(Bundle::new().with(
            "main",
            Bundle::new().with("stack", vec!["home".to_owned(), "gone".to_owned()]),
        ));
        let built = ViewNavigator::builder("main", "home")
            .saved_state(Rc::new(stale))
            .build(|scope| {
                scope.nav_view("home", true, ViewHooks::new(), |_, _| View::new("home"));
            });
        assert!(matches!(built, Err(NavError::UnknownRoute(ref r)) if r == "gone"));
    }

    #[test]
    fn test_empty_saved_stack_starts_fresh() {
        let store = SavedStateStore::restored(
            Bundle::new().with("main", Bundle::new().with("stack", Vec::<String>::new())),
        );
        let nav = ViewNavigator::builder("main", "home")
            .init_args(Bundle::new().with("fresh", true))
            .saved_state(Rc::new(store))
            .build(|scope| {
                scope.nav_view("home", true, ViewHooks::new(), |_, _| View::new("home"));
            })
            .unwrap();

        assert_eq!(nav.view_stack_size(), 1);
        let args = nav.entry("home", 0).unwrap().args().unwrap();
        assert_eq!(args.get_bool("fresh"), Some(true));
    }

    #[test]
    fn test_duplicate_navigator_name_in_one_scope() {
        let store = Rc::new(SavedStateStore::new());
        let build = || {
            ViewNavigator::builder("main", "a")
                .saved_state(store.clone())
                .build(|scope| {
                    scope.nav_view("a", true, ViewHooks::new(), |_, _| View::new("a"));
                })
        };

        let first = build().unwrap();
        assert!(matches!(build(), Err(NavError::DuplicateNavigator(ref n)) if n == "main"));
        assert!(store.has_provider("main"));

        drop(first);
        assert!(!store.has_provider("main"));
        assert!(build().is_ok());
    }

    #[test]
    fn test_work_scope_follows_attachment() {
        let h = harness("a", &[("a", true), ("b", true)]);
        let first = h.nav.entry("a", 0).unwrap().scope();
        assert!(first.is_active());

        let cancelled = Rc::new(Cell::new(false));
        let flag = cancelled.clone();
        first.on_cancel(move || flag.set(true));

        h.nav.navigate_to("b", None).unwrap();
        assert!(!first.is_active());
        assert!(cancelled.get());

        let b_scope = h.nav.entry("b", 1).unwrap().scope();
        assert!(b_scope.is_active());

        h.nav.pop(false).unwrap();
        assert!(!b_scope.is_active());
        let second = h.nav.entry("a", 0).unwrap().scope();
        assert!(second.is_active());
        assert!(!second.ptr_eq(&first));
        assert_eq!(h.builds("a"), 1);
    }

    #[test]
    fn test_work_scope_waits_for_first_attach() {
        let container =
            Rc::new(NavigationContainer::new("root").with_animation_params(AnimationParams::none()));
        let nav = ViewNavigator::builder("main", "a")
            .container(container.clone())
            .build(|scope| {
                scope.nav_view("a", true, ViewHooks::new(), |_, _| View::new("a"));
            })
            .unwrap();

        let built = nav.entry("a", 0).unwrap().scope();
        assert!(!built.is_active());
        let ran = Rc::new(Cell::new(false));
        let flag = ran.clone();
        built.on_cancel(move || flag.set(true));
        assert!(ran.get());

        container.container().attach_to_window();
        let live = nav.entry("a", 0).unwrap().scope();
        assert!(live.is_active());
        assert!(!live.ptr_eq(&built));
    }

    struct DropCount(Rc<Cell<usize>>);

    impl Drop for DropCount {
        fn drop(&mut self) {
            self.0.set(self.0.get() + 1);
        }
    }

    #[test]
    fn test_replaced_uncached_views_are_freed() {
        let container =
            Rc::new(NavigationContainer::new("root").with_animation_params(AnimationParams::none()));
        let dropped = Rc::new(Cell::new(0));
        let counter = dropped.clone();
        let nav = ViewNavigator::builder("main", "a")
            .container(container.clone())
            .build(move |scope| {
                let counter = counter.clone();
                scope.nav_view("a", false, ViewHooks::new(), move |_, _| {
                    View::with_content("a", DropCount(counter.clone()))
                });
                scope.nav_view("b", true, ViewHooks::new(), |_, _| View::new("b"));
            })
            .unwrap();

        // never attached: the first build goes once the pop rebuilds `a`
        nav.navigate_to("b", None).unwrap();
        nav.pop(false).unwrap();
        assert_eq!(dropped.get(), 1);

        container.container().attach_to_window();
        nav.navigate_to("b", None).unwrap();
        assert_eq!(dropped.get(), 2);
    }

    #[test]
    fn test_cached_views_reused_uncached_rebuilt() {
        let h = harness("a", &[("a", true), ("b", false), ("c", true)]);
        let a_view = h.nav.current_view().unwrap();
        h.nav.navigate_to("b", None).unwrap();
        h.nav.navigate_to("c", None).unwrap();

        h.nav.pop(false).unwrap();
        assert_eq!(h.builds("b"), 2);

        h.nav.pop(false).unwrap();
        assert_eq!(h.builds("a"), 1);
        assert!(h.nav.current_view().unwrap().ptr_eq(&a_view));
        assert_eq!(h.container.container().child_count(), 1);
    }

    #[test]
    fn test_pop_to_applies_args_only_when_given() {
        let h = harness("a", &[("a", true), ("b", true)]);
        h.nav.navigate_to("b", None).unwrap();

        let args = Bundle::new().with("x", 1_i64);
        assert!(h.nav.pop_to("a", false, Some(args.clone())).unwrap());
        assert_eq!(h.nav.entry("a", 0).unwrap().args(), Some(args.clone()));

        h.nav.navigate_to("b", None).unwrap();
        h.nav.pop(false).unwrap();
        assert_eq!(h.nav.entry("a", 0).unwrap().args(), Some(args));
    }

    #[test]
    fn test_init_args_reach_first_screen() {
        let seen = Rc::new(RefCell::new(None));
        let sink = seen.clone();
        let nav = ViewNavigator::builder("main", "a")
            .container(still_container("root"))
            .init_args(Bundle::new().with("user", "ada"))
            .build(move |scope| {
                let hooks = ViewHooks::<View>::new().on_attach(move |_, _, entry: &StackEntry| {
                    *sink.borrow_mut() = entry.with_args(|a| {
                        a.and_then(|a| a.get_string("user")).map(str::to_owned)
                    });
                });
                scope.nav_view("a", true, hooks, |_, _| View::new("a"));
            })
            .unwrap();

        assert_eq!(seen.borrow().as_deref(), Some("ada"));
        assert_eq!(nav.view_stack_size(), 1);
    }

    #[test]
    fn test_route_change_listener_and_dispose() {
        let h = harness("a", &[("a", true), ("b", true)]);
        let changes = Rc::new(RefCell::new(Vec::new()));
        let sink = changes.clone();
        let stop = h.nav.add_route_change_listener(move |prev, next| {
            sink.borrow_mut()
                .push((prev.map(|r| r.to_string()), next.to_string()));
        });

        h.nav.navigate_to("b", None).unwrap();
        h.nav.pop(false).unwrap();
        stop.run();
        h.nav.navigate_to("b", None).unwrap();

        assert_eq!(
            *changes.borrow(),
            [
                (Some("a".to_owned()), "b".to_owned()),
                (Some("b".to_owned()), "a".to_owned()),
            ]
        );
    }

    fn animated_harness(clock: &Rc<ManualClock>) -> (ViewNavigator, Rc<NavigationContainer>) {
        let container = Rc::new(NavigationContainer::with_clock("root", clock.clone()));
        container.container().set_size(Size::new(100.0, 50.0));
        container.container().attach_to_window();
        let nav = ViewNavigator::builder("main", "a")
            .container(container.clone())
            .build(|scope| {
                for route in ["a", "b", "c"] {
                    scope.nav_view(route, true, ViewHooks::new(), move |_, _| View::new(route));
                }
            })
            .unwrap();
        (nav, container)
    }

    #[test]
    fn test_push_animates_both_views_then_settles() {
        let clock = Rc::new(ManualClock::new());
        let (nav, container) = animated_harness(&clock);
        let root = container.container().clone();
        assert_eq!(root.child_count(), 1);
        assert!(!container.is_animating());

        nav.navigate_to("b", None).unwrap();
        let b = nav.current_view().unwrap();
        assert_eq!(root.child_count(), 2);
        assert!(container.is_animating());
        assert!((b.translation_x() - 100.0).abs() < 1e-3);
        assert!(b.alpha() < 1e-3);

        clock.advance(Duration::from_millis(200));
        assert!(container.on_frame());
        assert_eq!(root.child_count(), 2);
        assert!(b.translation_x() > 0.0 && b.translation_x() < 100.0);

        clock.advance(Duration::from_millis(250));
        assert!(!container.on_frame());
        assert_eq!(root.children(), [b.clone()]);
        assert!(b.transform().is_identity());
        assert_eq!(b.alpha(), 1.0);
        assert!(!container.is_animating());
    }

    #[test]
    fn test_new_transition_cancels_running_one() {
        let clock = Rc::new(ManualClock::new());
        let (nav, container) = animated_harness(&clock);
        let root = container.container().clone();
        let a = nav.current_view().unwrap();

        nav.navigate_to("b", None).unwrap();
        let b = nav.current_view().unwrap();
        clock.advance(Duration::from_millis(100));
        container.on_frame();

        nav.navigate_to("c", None).unwrap();
        let c = nav.current_view().unwrap();
        assert!(a.parent().is_none());
        assert!(a.transform().is_identity());
        assert_eq!(root.children(), [b.clone(), c.clone()]);

        clock.advance(Duration::from_millis(400));
        assert!(!container.on_frame());
        assert_eq!(root.children(), [c]);
        assert!(b.parent().is_none());
    }

    #[test]
    fn test_pop_uses_pop_animations() {
        let clock = Rc::new(ManualClock::new());
        let (nav, container) = animated_harness(&clock);
        nav.navigate_to("b", None).unwrap();
        clock.advance(Duration::from_millis(400));
        container.on_frame();
        let b = nav.current_view().unwrap();

        nav.pop(false).unwrap();
        let a = nav.current_view().unwrap();
        assert_eq!(a.label(), "a");
        // revealed screen comes in from the leading edge
        assert!((a.translation_x() + 100.0).abs() < 1e-3);
        assert!(b.translation_x().abs() < 1e-3);

        clock.advance(Duration::from_millis(400));
        container.on_frame();
        assert_eq!(container.container().children(), [a]);
    }

    #[test]
    fn test_container_reattach_rebuilds_front_view() {
        let h = harness("a", &[("a", false)]);
        let root = h.container.container().clone();
        let first = h.nav.current_view().unwrap();
        let scope = h.nav.entry("a", 0).unwrap().scope();

        root.detach_from_window();
        assert!(!scope.is_active());

        root.attach_to_window();
        assert_eq!(h.builds("a"), 2);
        let second = h.nav.current_view().unwrap();
        assert!(!second.ptr_eq(&first));
        assert!(second.is_attached());
        assert_eq!(root.child_count(), 1);
        assert!(h.nav.entry("a", 0).unwrap().scope().is_active());
    }

    #[test]
    fn test_cached_front_view_survives_reattach() {
        let h = harness("a", &[("a", true)]);
        let root = h.container.container().clone();
        let first = h.nav.current_view().unwrap();

        root.detach_from_window();
        root.attach_to_window();

        assert_eq!(h.builds("a"), 1);
        assert!(h.nav.current_view().unwrap().ptr_eq(&first));
        assert!(first.is_attached());
        assert_eq!(root.child_count(), 1);
    }

    #[test]
    fn test_drop_tears_navigator_down() {
        let store = Rc::new(SavedStateStore::new());
        let container = still_container("root");
        let nav = ViewNavigator::builder("main", "a")
            .container(container.clone())
            .saved_state(store.clone())
            .build(|scope| {
                scope.nav_view("a", true, ViewHooks::new(), |_, _| View::new("a"));
                scope.nav_view("b", true, ViewHooks::new(), |_, _| View::new("b"));
            })
            .unwrap();
        nav.navigate_to("b", None).unwrap();
        let scope = nav.entry("b", 1).unwrap().scope();
        let controller = nav.controller();
        let root = container.container().clone();
        let listeners_before = root.attach_listener_count();

        drop(nav);

        assert!(!scope.is_active());
        assert!(!store.has_provider("main"));
        assert_eq!(root.child_count(), 0);
        assert_eq!(root.attach_listener_count(), listeners_before - 1);
        assert!(!controller.is_bound());
        assert!(!controller.navigate_to("a", None).unwrap());
    }

    #[test]
    fn test_unbound_controller_is_inert() {
        let controller = NavController::new();
        assert!(!controller.is_bound());
        assert!(!controller.navigate_to("a", None).unwrap());
        assert!(!controller.pop(false).unwrap());
        assert!(!controller.pop_to("a", true, None).unwrap());
        assert_eq!(controller.current_route(), None);
        assert_eq!(controller.view_stack_size(), 0);
    }

    #[test]
    fn test_controller_created_before_navigator() {
        let controller = NavController::new();
        let nav = ViewNavigator::builder("main", "a")
            .controller(controller.clone())
            .container(still_container("root"))
            .build(|scope| {
                scope.nav_view("a", true, ViewHooks::new(), |_, _| View::new("a"));
                scope.nav_view("b", true, ViewHooks::new(), |_, _| View::new("b"));
            })
            .unwrap();

        assert!(controller.is_bound());
        assert!(controller.navigate_to("b", None).unwrap());
        assert_eq!(controller.current_route().unwrap(), "b");
        assert_eq!(nav.view_stack_size(), 2);
    }

    #[test]
    fn test_last_registration_wins() {
        let nav = {
            let container = still_container("root");
            ViewNavigator::builder("main", "a")
                .container(container)
                .build(|scope| {
                    scope.nav_view("a", true, ViewHooks::new(), |_, _| View::new("first"));
                    scope.nav_view("a", true, ViewHooks::new(), |_, _| View::new("second"));
                })
                .unwrap()
        };
        assert_eq!(nav.current_view().unwrap().label(), "second");
    }

    struct Counter {
        updates: Rc<Cell<u32>>,
        detaches: Rc<Cell<u32>>,
        intercept: Rc<Cell<bool>>,
    }

    impl ViewController for Counter {
        fn build_view(&mut self, entry: &StackEntry) -> View {
            View::new(format!("counter_{}", entry.position()))
        }

        fn update(&mut self, _view: &View, _entry: &StackEntry) {
            self.updates.set(self.updates.get() + 1);
        }

        fn on_detach(&mut self, _view: &View, _entry: &StackEntry) {
            self.detaches.set(self.detaches.get() + 1);
        }

        fn on_pop(&mut self, _view: &View, _target: Option<&Route>) -> PopResult {
            if self.intercept.get() {
                PopResult::Intercept
            } else {
                PopResult::DoNothing
            }
        }
    }

    #[test]
    fn test_view_controller_screen() {
        let updates = Rc::new(Cell::new(0));
        let detaches = Rc::new(Cell::new(0));
        let intercept = Rc::new(Cell::new(true));
        let created = Rc::new(Cell::new(0));

        let nav = {
            let (updates, detaches, intercept, created) = (
                updates.clone(),
                detaches.clone(),
                intercept.clone(),
                created.clone(),
            );
            ViewNavigator::builder("main", "home")
                .container(still_container("root"))
                .build(move |scope| {
                    scope.nav_view("home", true, ViewHooks::new(), |_, _| View::new("home"));
                    scope.nav_view_controller("counter", move |_, _| {
                        created.set(created.get() + 1);
                        Counter {
                            updates: updates.clone(),
                            detaches: detaches.clone(),
                            intercept: intercept.clone(),
                        }
                    });
                })
                .unwrap()
        };

        nav.navigate_to("counter", None).unwrap();
        assert_eq!(updates.get(), 1);
        assert_eq!(nav.current_view().unwrap().label(), "counter_1");

        assert!(nav.pop(false).unwrap());
        assert_eq!(nav.view_stack_size(), 2);

        intercept.set(false);
        assert!(nav.pop(false).unwrap());
        assert_eq!(nav.view_stack_size(), 1);
        assert_eq!(detaches.get(), 1);

        nav.navigate_to("counter", None).unwrap();
        assert_eq!(created.get(), 1);
        assert_eq!(updates.get(), 2);
    }

    struct Card {
        root: View,
        title: String,
    }

    impl ViewBinding for Card {
        fn root(&self) -> &View {
            &self.root
        }
    }

    #[test]
    fn test_binding_screen_hooks_see_binding() {
        let titles = Rc::new(RefCell::new(Vec::new()));
        let sink = titles.clone();
        let nav = ViewNavigator::builder("main", "card")
            .container(still_container("root"))
            .init_args(Bundle::new().with("title", "hello"))
            .build(move |scope| {
                let hooks = ViewHooks::new().on_attach(move |_, card: &Card, _| {
                    sink.borrow_mut().push(card.title.clone());
                });
                scope.nav_view_binding("card", hooks, |_, entry| Card {
                    root: View::new("card"),
                    title: entry
                        .with_args(|a| a.and_then(|a| a.get_string("title")).map(str::to_owned))
                        .unwrap_or_default(),
                });
            })
            .unwrap();

        assert_eq!(*titles.borrow(), ["hello"]);
        assert_eq!(nav.current_view().unwrap().label(), "card");
    }

    #[test]
    fn test_nested_navigator_pops_out_to_parent() {
        let outer_controller = NavController::new();
        let inner = ViewNavigator::builder("inner", "i1")
            .container(Rc::new(
                NavigationContainer::new("inner").with_animation_params(AnimationParams::none()),
            ))
            .build(|scope| {
                scope.nav_view("i1", true, ViewHooks::new(), |_, _| View::new("i1"));
                scope.nav_view("i2", true, ViewHooks::new(), |_, _| View::new("i2"));
            })
            .unwrap();
        let parent = outer_controller.clone();
        let _forward = inner.add_on_pop_out_listener(move || parent.pop(false).unwrap_or(false));

        let inner_view = inner.container_view();
        let outer = ViewNavigator::builder("outer", "home")
            .controller(outer_controller.clone())
            .container(still_container("outer"))
            .build(move |scope| {
                scope.nav_view("home", true, ViewHooks::new(), |_, _| View::new("home"));
                scope.nav_view("nested", true, ViewHooks::new(), move |_, _| {
                    inner_view.clone()
                });
            })
            .unwrap();

        outer.navigate_to("nested", None).unwrap();
        assert!(inner.container_view().is_attached());
        inner.navigate_to("i2", None).unwrap();

        assert!(inner.pop(false).unwrap());
        assert_eq!(inner.view_stack_size(), 1);
        assert_eq!(outer.view_stack_size(), 2);

        assert!(inner.pop(false).unwrap());
        assert_eq!(outer.current_route().unwrap(), "home");
        assert!(!inner.container_view().is_attached());
    }

    #[test]
    fn test_entry_store_keys_by_route_and_position() {
        let mut store = EntryStore::new();
        let a = Route::from("a");
        let first = store.get_or_create(&a, 0);
        assert!(store.get_or_create(&a, 0).ptr_eq(&first));
        let second = store.get_or_create(&a, 1);
        assert!(!second.ptr_eq(&first));
        assert_eq!(store.len(), 2);

        let drained = store.drain();
        assert_eq!(drained.len(), 2);
        assert!(store.is_empty());
        assert!(store.get(&a, 0).is_none());
    }

    #[test]
    fn test_animation_params_enablement() {
        assert!(AnimationParams::default().is_enabled());
        assert!(!AnimationParams::none().is_enabled());
        assert!(!AnimationParams::builder().build().is_enabled());

        let slide_only = AnimationParams::builder()
            .duration(Duration::from_millis(250))
            .add_animations(
                horizontal_enter(),
                crate::animation::horizontal_exit(),
                crate::animation::horizontal_pop_enter(),
                horizontal_pop_exit(),
            )
            .build();
        assert!(slide_only.is_enabled());
        assert_eq!(slide_only.spec().duration, Duration::from_millis(250));

        let zero = AnimationParams {
            duration: Duration::ZERO,
            ..AnimationParams::default()
        };
        assert!(!zero.is_enabled());
    }

    #[test]
    fn test_horizontal_presets_mirror_for_rtl() {
        let view = View::new("v");
        horizontal_enter().on_animate(&view, 0.0, 200.0, 100.0);
        assert_eq!(view.translation_x(), 200.0);

        view.set_layout_direction(LayoutDirection::Rtl);
        horizontal_enter().on_animate(&view, 0.0, 200.0, 100.0);
        assert_eq!(view.translation_x(), -200.0);

        horizontal_pop_exit().on_animate(&view, 1.0, 200.0, 100.0);
        assert_eq!(view.translation_x(), 200.0);
    }

    #[test]
    fn test_bundle_typed_access() {
        let mut b = Bundle::new()
            .with("name", "ada")
            .with("age", 36_i64)
            .with("ratio", 0.5)
            .with("tags", vec!["x".to_owned(), "y".to_owned()])
            .with("nested", Bundle::new().with("ok", true));
        b.put("age", 37_i64);

        assert_eq!(b.len(), 5);
        assert_eq!(b.keys().collect::<Vec<_>>(), ["name", "age", "ratio", "tags", "nested"]);
        assert_eq!(b.get_string("name"), Some("ada"));
        assert_eq!(b.get_int("age"), Some(37));
        assert_eq!(b.get_float("ratio"), Some(0.5));
        assert_eq!(b.get_string_array("tags").map(<[String]>::len), Some(2));
        assert_eq!(b.get_bundle("nested").and_then(|n| n.get_bool("ok")), Some(true));
        assert_eq!(b.get_int("name"), None);

        assert!(b.remove("name").is_some());
        assert!(!b.contains_key("name"));
        assert_eq!(b.keys().collect::<Vec<_>>(), ["age", "ratio", "tags", "nested"]);
    }

    #[test]
    fn test_bundle_keys_stay_unique() {
        let mut b: Bundle =
            serde_json::from_str(r#"{"k":{"str":"a"},"n":{"int":1},"k":{"str":"b"}}"#).unwrap();
        assert_eq!(b.len(), 2);
        assert_eq!(b.get_string("k"), Some("b"));

        assert_eq!(b.remove("k"), Some(BundleValue::Str("b".to_owned())));
        assert!(!b.contains_key("k"));
        assert_eq!(b.get("k"), None);

        let collected: Bundle = [("x", 1_i64), ("y", 2), ("x", 3)].into_iter().collect();
        assert_eq!(collected.keys().collect::<Vec<_>>(), ["x", "y"]);
        assert_eq!(collected.get_int("x"), Some(3));
    }
}
