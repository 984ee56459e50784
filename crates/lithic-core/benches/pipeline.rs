use std::any::Any;
use std::sync::{Arc, Mutex};

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use lithic_core::{
    Binder, Component, ComponentError, ComponentTree, Content, ContentAllocator, InlineScheduler,
    MountPayload, MountState, MountableComponent, Preparation, RenderComponent, ResolveScope,
    State,
};
use lithic_layout::{MeasureSpec, Size};
use lithic_style::Style;
use lithic_testing::StackLayoutEngine;

const SECTION_COUNT: usize = 4;
const ROWS_PER_SECTION: usize = 64;
const ROWS_PER_SECTION_SAMPLES: &[usize] = &[ROWS_PER_SECTION];
const ROOT_WIDTH: f32 = 1080.0;
const ROOT_HEIGHT: f32 = 1920.0;

struct TextAllocator;

impl ContentAllocator for TextAllocator {
    fn create_content(&self) -> Content {
        Box::new(String::new())
    }

    fn content_kind(&self) -> &'static str {
        "text"
    }
}

struct TextBinder {
    text: String,
}

impl Binder for TextBinder {
    fn bind(&self, content: &mut Content) -> Result<(), ComponentError> {
        if let Some(slot) = content.downcast_mut::<String>() {
            slot.clone_from(&self.text);
        }
        Ok(())
    }

    fn unbind(&self, content: &mut Content) {
        if let Some(slot) = content.downcast_mut::<String>() {
            slot.clear();
        }
    }

    fn should_update(&self, previous: &dyn Binder) -> bool {
        previous
            .as_any()
            .downcast_ref::<TextBinder>()
            .map_or(true, |previous| previous.text != self.text)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[derive(Clone)]
struct Text {
    text: String,
}

impl MountableComponent for Text {
    fn name(&self) -> &'static str {
        "Text"
    }

    fn prepare(&self, _scope: &ResolveScope) -> Result<Preparation, ComponentError> {
        let width = 8.0 * self.text.len() as f32;
        let payload = MountPayload::new(TextAllocator)
            .with_binder(TextBinder {
                text: self.text.clone(),
            })
            .with_measure(move |w, h| Size::new(w.resolve(width), h.resolve(16.0)));
        Ok(Preparation::new(payload))
    }

    fn is_equivalent(&self, other: &dyn Any) -> bool {
        other
            .downcast_ref::<Text>()
            .is_some_and(|other| other.text == self.text)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Feed of `sections` columns; each section header carries the tick so a
/// state update re-prepares the headers while the row subtrees hit the
/// equivalence skip, the steady-state shape of an incremental update.
struct Feed {
    sections: usize,
    rows_per_section: usize,
    handle: Arc<Mutex<Option<State<u32>>>>,
}

impl RenderComponent for Feed {
    fn name(&self) -> &'static str {
        "Feed"
    }

    fn render(&self, _scope: &ResolveScope) -> Result<Component, ComponentError> {
        let tick = lithic_core::use_state(|| 0u32);
        *self.handle.lock().unwrap() = Some(tick.clone());
        let tick = tick.get();
        let mut sections = Vec::with_capacity(self.sections);
        for section in 0..self.sections {
            let mut children = Vec::with_capacity(self.rows_per_section + 1);
            children.push(Component::mountable(Text {
                text: format!("Section {section} tick {tick}"),
            }));
            for row in 0..self.rows_per_section {
                children.push(Component::mountable(Text {
                    text: format!("Item {section}-{row} title"),
                }));
            }
            sections.push(Component::container(Style::empty(), children));
        }
        Ok(Component::container(Style::empty(), sections))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

struct PipelineFixture {
    tree: ComponentTree,
    mount: MountState,
    handle: Arc<Mutex<Option<State<u32>>>>,
}

impl PipelineFixture {
    fn new(sections: usize, rows_per_section: usize) -> Self {
        let tree = ComponentTree::new(Arc::new(StackLayoutEngine), Box::new(InlineScheduler));
        let handle = Arc::new(Mutex::new(None));
        tree.set_root_sync(Component::render(Feed {
            sections,
            rows_per_section,
            handle: Arc::clone(&handle),
        }));
        tree.run_main_tasks();
        Self {
            tree,
            mount: MountState::new(),
            handle,
        }
    }

    fn bump(&self) {
        let handle = self.handle.lock().unwrap().clone().expect("state captured");
        handle.update_with(|tick| tick + 1);
        self.tree.run_main_tasks();
    }

    fn measure(&self) -> lithic_core::LayoutResult {
        self.tree
            .measure(
                MeasureSpec::Exactly(ROOT_WIDTH),
                MeasureSpec::AtMost(ROOT_HEIGHT),
            )
            .expect("committed tree")
    }
}

fn ui_object_count(sections: usize, rows_per_section: usize) -> usize {
    1 + sections * (2 + rows_per_section)
}

fn bench_resolve(c: &mut Criterion) {
    let sections = SECTION_COUNT;
    let mut group = c.benchmark_group("pipeline_resolve");
    for &rows_per_section in ROWS_PER_SECTION_SAMPLES {
        let total_ui_objects = ui_object_count(sections, rows_per_section);
        group.bench_with_input(
            BenchmarkId::new("ui_objects", total_ui_objects),
            &(sections, rows_per_section),
            |b, &(sections, rows_per_section)| {
                let fixture = PipelineFixture::new(sections, rows_per_section);
                // Warm up so steady-state incremental resolution is measured.
                fixture.bump();

                b.iter(|| {
                    fixture.bump();
                });
            },
        );
    }
    group.finish();
}

fn bench_measure(c: &mut Criterion) {
    let sections = SECTION_COUNT;
    let mut group = c.benchmark_group("pipeline_measure");
    for &rows_per_section in ROWS_PER_SECTION_SAMPLES {
        let total_ui_objects = ui_object_count(sections, rows_per_section);
        group.bench_with_input(
            BenchmarkId::new("ui_objects", total_ui_objects),
            &(sections, rows_per_section),
            |b, &(sections, rows_per_section)| {
                let fixture = PipelineFixture::new(sections, rows_per_section);
                b.iter(|| {
                    black_box(fixture.measure());
                });
            },
        );
    }
    group.finish();
}

fn bench_mount(c: &mut Criterion) {
    let sections = SECTION_COUNT;
    let mut group = c.benchmark_group("pipeline_mount");
    for &rows_per_section in ROWS_PER_SECTION_SAMPLES {
        let total_ui_objects = ui_object_count(sections, rows_per_section);
        group.bench_with_input(
            BenchmarkId::new("ui_objects", total_ui_objects),
            &(sections, rows_per_section),
            |b, &(sections, rows_per_section)| {
                let mut fixture = PipelineFixture::new(sections, rows_per_section);
                let layout = fixture.measure();
                fixture
                    .tree
                    .mount(&layout, &mut fixture.mount)
                    .expect("initial mount");

                b.iter(|| {
                    fixture.bump();
                    let layout = fixture.measure();
                    fixture
                        .tree
                        .mount(&layout, &mut fixture.mount)
                        .expect("mount");
                });
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_resolve, bench_measure, bench_mount);
criterion_main!(benches);
