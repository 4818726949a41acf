// Well-known AbraFlexi evidences

use serde::Serialize;

/// Catalog entry describing one evidence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EvidenceInfo {
    pub name: &'static str,
    pub description: &'static str,
}

pub const ISSUED_INVOICES: &str = "faktura-vydana";
pub const RECEIVED_INVOICES: &str = "faktura-prijata";
pub const CONTACTS: &str = "adresar";
pub const PRODUCTS: &str = "cenik";
pub const BANK: &str = "banka";

const CATALOG: &[EvidenceInfo] = &[
    EvidenceInfo { name: ISSUED_INVOICES, description: "Issued invoices" },
    EvidenceInfo { name: RECEIVED_INVOICES, description: "Received invoices" },
    EvidenceInfo { name: CONTACTS, description: "Contacts and companies" },
    EvidenceInfo { name: PRODUCTS, description: "Products and services" },
    EvidenceInfo { name: BANK, description: "Bank transactions" },
    EvidenceInfo { name: "pokladna", description: "Cash transactions" },
    EvidenceInfo { name: "nabidka-vydana", description: "Issued quotes" },
    EvidenceInfo { name: "objednavka-vydana", description: "Issued orders" },
    EvidenceInfo { name: "objednavka-prijata", description: "Received orders" },
    EvidenceInfo { name: "dodaci-list", description: "Delivery notes" },
    EvidenceInfo { name: "sklad", description: "Warehouse/stock" },
    EvidenceInfo { name: "cenova-uroven", description: "Price levels" },
    EvidenceInfo { name: "typ-smlouvy", description: "Contract types" },
];

/// Common evidences, in a stable order.
pub fn known_evidences() -> &'static [EvidenceInfo] {
    CATALOG
}

pub fn describe(name: &str) -> Option<&'static EvidenceInfo> {
    CATALOG.iter().find(|info| info.name == name)
}
