mod money;
mod secret;

pub use money::{Pesos, PesosConversionError, DEFAULT_CURRENCY_CODE};
pub use secret::Secret;
