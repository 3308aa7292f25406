#![warn(clippy::pedantic)]
#![allow(
    clippy::cast_lossless,
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate,
    clippy::many_single_char_names,
    clippy::module_name_repetitions,
    clippy::too_many_lines,
    clippy::similar_names,
    clippy::doc_markdown,
    clippy::neg_cmp_op_on_partial_ord,
    clippy::float_cmp
)]
pub mod bodies;
pub mod condition;
pub mod config;
pub mod distribution;
pub mod error;
pub mod formula;
pub mod frame;
pub mod kepler;
pub mod manager;
pub mod random;
pub mod range;
pub mod select;
pub mod sets;
pub mod spawner;
pub mod time;
