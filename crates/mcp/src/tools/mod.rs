pub mod args;
pub mod bank;
pub mod contact;
pub mod envelope;
pub mod evidence;
pub mod invoice;
pub mod product;
pub mod records;
mod ops;
mod registry;

pub use bank::BankTransactionCreateTool;
pub use contact::ContactCreateTool;
pub use envelope::Payload;
pub use evidence::{
    EvidenceCreateTool, EvidenceDeleteTool, EvidenceGetTool, EvidenceListTool, EvidenceUpdateTool,
};
pub use invoice::InvoiceCreateTool;
pub use product::ProductCreateTool;
pub use records::{
    RecordDeleteTool, RecordGetTool, RecordUpdateTool, TypedEvidence, BANK_TRANSACTIONS,
    CONTACTS, ISSUED_INVOICES, PRODUCTS, RECEIVED_INVOICES,
};
pub use registry::{
    json_schema_array, json_schema_fields, json_schema_id, json_schema_integer,
    json_schema_number, json_schema_object, json_schema_string, Tool, ToolRegistry,
};

use abraflexi_core::RecordStore;
use std::sync::Arc;

/// Register the full AbraFlexi tool menu against one record store.
pub fn register_all(registry: &mut ToolRegistry, store: Arc<dyn RecordStore>) {
    // Issued invoices
    registry.register(Arc::new(RecordGetTool::new(store.clone(), ISSUED_INVOICES)));
    registry.register(Arc::new(InvoiceCreateTool::new(store.clone(), ISSUED_INVOICES)));
    registry.register(Arc::new(RecordUpdateTool::new(store.clone(), ISSUED_INVOICES)));
    registry.register(Arc::new(RecordDeleteTool::new(store.clone(), ISSUED_INVOICES)));

    // Received invoices
    registry.register(Arc::new(RecordGetTool::new(store.clone(), RECEIVED_INVOICES)));
    registry.register(Arc::new(InvoiceCreateTool::new(store.clone(), RECEIVED_INVOICES)));

    // Contacts
    registry.register(Arc::new(RecordGetTool::new(store.clone(), CONTACTS)));
    registry.register(Arc::new(ContactCreateTool::new(store.clone())));
    registry.register(Arc::new(RecordUpdateTool::new(store.clone(), CONTACTS)));
    registry.register(Arc::new(RecordDeleteTool::new(store.clone(), CONTACTS)));

    // Products
    registry.register(Arc::new(RecordGetTool::new(store.clone(), PRODUCTS)));
    registry.register(Arc::new(ProductCreateTool::new(store.clone())));
    registry.register(Arc::new(RecordUpdateTool::new(store.clone(), PRODUCTS)));
    registry.register(Arc::new(RecordDeleteTool::new(store.clone(), PRODUCTS)));

    // Bank transactions
    registry.register(Arc::new(RecordGetTool::new(store.clone(), BANK_TRANSACTIONS)));
    registry.register(Arc::new(BankTransactionCreateTool::new(store.clone())));

    // Any evidence
    registry.register(Arc::new(EvidenceGetTool::new(store.clone())));
    registry.register(Arc::new(EvidenceCreateTool::new(store.clone())));
    registry.register(Arc::new(EvidenceUpdateTool::new(store.clone())));
    registry.register(Arc::new(EvidenceDeleteTool::new(store)));
    registry.register(Arc::new(EvidenceListTool));
}
