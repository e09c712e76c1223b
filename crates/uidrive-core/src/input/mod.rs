pub mod errors;
pub mod injector;
pub mod operations;
pub mod types;

pub use errors::InputError;
pub use injector::Injector;
pub use operations::{append_key_inputs, parse_button_name, parse_key_name};
pub use types::{InputAction, KeyInput, MouseButton, VirtualKey};
