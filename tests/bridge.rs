//! The live bridge driven by a real render loop

use fiber_spy::spy::bridge::{DevtoolsHook, FiberSpy, Listener};
use fiber_spy::spy::host::Renderer;
use fiber_spy::spy::runtime::Value;
use fiber_spy::spy::testing::{assert_structures, compile_and_load, Harness, TEST_FILE};
use std::cell::Cell;
use std::collections::BTreeMap;
use std::rc::Rc;
use tokio::task::LocalSet;

const SOURCE: &str = "export const App = <p>{\"app\"}</p>\nexport const Other = <i />";

fn element(name: &str) -> Value {
    let instance = compile_and_load(SOURCE, TEST_FILE).expect("loads");
    instance.export(name).cloned().expect("export")
}

fn counter() -> (Listener, Rc<Cell<usize>>) {
    let count = Rc::new(Cell::new(0));
    let inner = count.clone();
    (Rc::new(move || inner.set(inner.get() + 1)), count)
}

fn text_props(t: &str) -> Value {
    let mut fields = BTreeMap::new();
    fields.insert("t".to_string(), Value::from(t));
    Value::object(fields)
}

#[tokio::test]
async fn every_commit_after_registration_notifies() {
    let mut harness = Harness::new();
    let (listener, count) = counter();
    harness.spy.subscribe(listener);

    let source = "export const App = (props) => <p>{props.t}</p>";
    harness
        .render_export(source, "App", text_props("one"))
        .expect("renders");
    assert_eq!(count.get(), 0);

    // Only the registration was queued: the refresh handler is installed
    // while handling it
    assert_eq!(harness.driver.drain().await, 1);
    assert_eq!(count.get(), 1);

    harness
        .render_export(source, "App", text_props("two"))
        .expect("renders");
    assert_eq!(harness.driver.drain().await, 1);
    assert_eq!(count.get(), 2);

    let structures = harness.structure().expect("a structure");
    assert_structures(&structures).count(1).entry(0, |p| {
        p.child(0, |text| {
            text.component(0, |c| {
                c.value(&Value::from("two"));
            });
        });
    });
}

#[tokio::test]
async fn root_index_selects_a_committed_root() {
    let hook = DevtoolsHook::new();
    let (spy, mut driver) = FiberSpy::attach(&hook);
    let renderer = Renderer::new(&hook);
    let first = renderer.create_container();
    let second = renderer.create_container();
    renderer.render(&element("App"), &first).expect("renders");
    renderer.render(&element("Other"), &second).expect("renders");
    driver.drain().await;

    let name_at = |index: Option<usize>| {
        spy.get_current_structure(index).map(|structures| {
            structures[0].components[0]
                .component
                .name()
                .map(str::to_string)
        })
    };
    assert_eq!(name_at(Some(0)), Some(Some("p".to_string())));
    assert_eq!(name_at(Some(1)), Some(Some("i".to_string())));
    assert_eq!(name_at(None), Some(Some("i".to_string())));
    assert_eq!(name_at(Some(2)), None);
}

#[tokio::test]
async fn a_new_renderer_takes_over() {
    let harness = Harness::new();
    harness.render(&element("App")).expect("renders");
    assert!(harness.structure().is_some());

    let newer = Renderer::new(&harness.hook);
    assert_eq!(harness.spy.active_renderer(), Some(newer.id()));
    assert!(harness.structure().is_none());

    let root = newer.create_container();
    newer.render(&element("Other"), &root).expect("renders");
    let structures = harness.structure().expect("a structure");
    assert_structures(&structures).count(1).entry(0, |i| {
        i.component_names(&[Some("i"), None]);
    });
}

#[tokio::test]
async fn spy_attached_late_sees_existing_renderers() {
    let hook = DevtoolsHook::new();
    let renderer = Renderer::new(&hook);
    let root = renderer.create_container();
    renderer.render(&element("Other"), &root).expect("renders");

    let (spy, mut driver) = FiberSpy::attach(&hook);
    assert_eq!(spy.active_renderer(), Some(renderer.id()));
    assert!(spy.get_current_structure(None).is_some());

    let (listener, count) = counter();
    spy.subscribe(listener);
    driver.drain().await;
    assert_eq!(count.get(), 1);

    renderer.render(&element("App"), &root).expect("renders");
    driver.drain().await;
    assert_eq!(count.get(), 2);
}

#[tokio::test]
async fn running_driver_notifies_and_stops_with_the_spy() {
    let local = LocalSet::new();
    local
        .run_until(async {
            let hook = DevtoolsHook::new();
            let (spy, driver) = FiberSpy::attach(&hook);
            let (listener, count) = counter();
            spy.subscribe(listener);
            let task = tokio::task::spawn_local(driver.run());

            let renderer = Renderer::new(&hook);
            let root = renderer.create_container();
            for _ in 0..8 {
                tokio::task::yield_now().await;
            }
            assert_eq!(count.get(), 1);

            renderer.render(&element("App"), &root).expect("renders");
            for _ in 0..8 {
                tokio::task::yield_now().await;
            }
            assert_eq!(count.get(), 2);

            drop(spy);
            task.await.expect("driver finishes");
        })
        .await;
}
