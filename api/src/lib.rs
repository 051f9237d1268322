pub mod attribution;
pub mod consts;
pub mod error;
pub mod loaders;
pub mod registry;
pub mod report;
pub mod sdk;
pub mod state;
pub mod tranche;

pub mod prelude {
    pub use crate::attribution::*;
    pub use crate::consts::*;
    pub use crate::error::*;
    pub use crate::loaders::*;
    pub use crate::registry::*;
    pub use crate::report::*;
    pub use crate::sdk::*;
    pub use crate::state::*;
    pub use crate::tranche::*;
}
