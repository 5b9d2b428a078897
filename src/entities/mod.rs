//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod exit_note;
pub mod exit_note_item;
pub mod payment_record;
pub mod seller;
pub mod system_state;

// Re-export specific types to avoid conflicts
pub use exit_note::{Column as ExitNoteColumn, Entity as ExitNote, Model as ExitNoteModel};
pub use exit_note_item::{
    Column as ExitNoteItemColumn, Entity as ExitNoteItem, Model as ExitNoteItemModel,
};
pub use payment_record::{
    Column as PaymentRecordColumn, Entity as PaymentRecord, Model as PaymentRecordModel,
};
pub use seller::{Column as SellerColumn, Entity as Seller, Model as SellerModel};
pub use system_state::{
    Column as SystemStateColumn, Entity as SystemState, Model as SystemStateModel,
};
