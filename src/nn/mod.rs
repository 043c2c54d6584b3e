//! Neural network interface: position tensors and move labels.
//!
//! The tensor layout and the label ordering are the contract shared with
//! whoever trains the policy/value network. Changing either invalidates
//! existing models.

pub mod encoding;
pub mod labels;

pub use encoding::{encode_position, NUM_CHANNELS, TENSOR_LEN, TENSOR_SHAPE};
pub use labels::{label_index, label_move, LabelError, NUM_LABELS};
