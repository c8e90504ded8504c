//! Property tests for the annotation engine's history.
//!
//! Invariants tested:
//! - N undos followed by N redos restore both the committed list and the exported raster
//! - committed strokes always equal the concatenation of the undo stack, whatever the sequence
//! - a new stroke after an undo leaves nothing to redo

use clinic_core::{AnnotationEngine, PenStyle, Point, Rgb, Surface, Tool};
use proptest::prelude::*;

const SIZE: u32 = 32;

// ── Helpers ───────────────────────────────────────────────────────────────────

fn engine() -> AnnotationEngine {
    AnnotationEngine::new(
        Surface::new(SIZE, SIZE, Rgb::WHITE),
        PenStyle {
            color: Rgb::BLACK,
            width: 2.0,
            tool: Tool::Pen,
        },
    )
}

fn draw(engine: &mut AnnotationEngine, gesture: &Gesture) {
    engine.set_pen(gesture.pen);
    let mut points = gesture.points.iter();
    if let Some(&(x, y)) = points.next() {
        engine.begin_stroke(Point::new(x, y, 0.5));
    }
    for &(x, y) in points {
        engine.extend_stroke(Point::new(x, y, 0.5));
    }
    engine.end_stroke();
}

#[derive(Clone, Debug)]
struct Gesture {
    points: Vec<(f32, f32)>,
    pen: PenStyle,
}

fn gesture() -> impl Strategy<Value = Gesture> {
    let coord = 0.0f32..SIZE as f32;
    (
        prop::collection::vec((coord.clone(), coord), 2..6),
        any::<(u8, u8, u8)>(),
        1.0f32..5.0,
        any::<bool>(),
    )
        .prop_map(|(points, (r, g, b), width, eraser)| Gesture {
            points,
            pen: PenStyle {
                color: Rgb::new(r, g, b),
                width,
                tool: if eraser { Tool::Eraser } else { Tool::Pen },
            },
        })
}

#[derive(Clone, Debug)]
enum Op {
    Draw(Gesture),
    Tap(f32, f32),
    Undo,
    Redo,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => gesture().prop_map(Op::Draw),
        1 => (0.0f32..SIZE as f32, 0.0f32..SIZE as f32).prop_map(|(x, y)| Op::Tap(x, y)),
        2 => Just(Op::Undo),
        2 => Just(Op::Redo),
    ]
}

// ── proptest! blocks ──────────────────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Undoing then redoing the last `k` strokes is the identity.
    #[test]
    fn prop_undo_redo_inverse(gestures in prop::collection::vec(gesture(), 0..6), k in 0usize..6) {
        let mut engine = engine();
        for g in &gestures {
            draw(&mut engine, g);
        }
        let k = k.min(gestures.len());
        let committed = engine.session().committed().to_vec();
        let snapshot = engine.snapshot().expect("snapshot");

        for _ in 0..k {
            engine.undo();
        }
        prop_assert_eq!(engine.session().committed().len(), gestures.len() - k);
        for _ in 0..k {
            engine.redo();
        }

        prop_assert_eq!(engine.session().committed(), &committed[..]);
        prop_assert_eq!(engine.snapshot().expect("snapshot"), snapshot);
    }

    /// Any interleaving of operations keeps the history consistent, and the live raster always
    /// equals a replay of the committed strokes.
    #[test]
    fn prop_history_stays_consistent(ops in prop::collection::vec(op(), 0..20)) {
        let mut engine = engine();
        for op in &ops {
            match op {
                Op::Draw(g) => draw(&mut engine, g),
                Op::Tap(x, y) => {
                    engine.begin_stroke(Point::new(*x, *y, 0.5));
                    engine.end_stroke();
                }
                Op::Undo => engine.undo(),
                Op::Redo => engine.redo(),
            }
            prop_assert!(engine.session().is_consistent());
        }

        let live = engine.surface().expect("attached").image().clone();
        engine.redraw();
        prop_assert_eq!(engine.surface().expect("attached").image(), &live);
    }

    /// Drawing after an undo discards the redo history.
    #[test]
    fn prop_new_stroke_clears_redo(
        gestures in prop::collection::vec(gesture(), 1..5),
        extra in gesture(),
    ) {
        let mut engine = engine();
        for g in &gestures {
            draw(&mut engine, g);
        }
        engine.undo();
        prop_assert!(engine.session().can_redo());

        draw(&mut engine, &extra);
        prop_assert!(!engine.session().can_redo());
        prop_assert_eq!(engine.session().committed().len(), gestures.len());
    }
}
