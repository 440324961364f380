pub mod engine;
pub mod prompts;
pub mod states;

pub use engine::{ScriptEngine, ScriptError, ScriptPolicy};
pub use states::{
    CallStage, Effect, EffectOutcome, FieldKey, HandoffReason, InputExpectation, MenuKind,
    MenuSelection, Reply, RouteSource, ScriptInput, TransitionOutcome,
};
