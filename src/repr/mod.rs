//! Model representations.
//!
//! - [`SoftmaxModel`]: group-sparse multinomial regression coefficients

mod softmax;

pub use softmax::SoftmaxModel;
