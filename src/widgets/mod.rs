//! Concrete core widgets, one module per capability family, plus
//! construction from resolved descriptors.

pub mod button;
pub mod categorical;
pub mod container;
pub mod create;
pub mod ranged;
pub mod sequence;
pub mod value;

pub use button::ButtonWidget;
pub use categorical::CategoricalWidget;
pub use container::{Container, ContainerError};
pub use create::{create_widget, WidgetCreationError};
pub use ranged::{RangedCore, RangedWidget, SliderWidget};
pub use sequence::{ListEdit, TupleEdit};
pub use value::ValueWidget;
