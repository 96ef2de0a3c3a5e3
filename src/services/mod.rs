// The two services. Each owns its store handle; handlers only see these.

mod credential;
mod inventory;

pub use credential::{CredentialAuthority, PASSWORD_LEN, USERNAME_LEN};
pub use inventory::{InventoryLedger, ItemResultStream};
