pub mod entities;
pub mod errors;
pub mod listing;
pub mod numbering;
pub mod ports;
pub mod reconcile;
pub mod services;
pub mod value_objects;

pub use entities::{Customer, Invoice, InvoiceHeader, InvoiceSummary, LineItem, LineItemData};
pub use errors::{InvoiceError, RepositoryError};
pub use listing::{InvoiceFilter, InvoiceListQuery, Pagination};
pub use numbering::next_invoice_number;
pub use ports::{
  AtomicSessionProvider, CustomerRepository, IdGenerator, InvoiceRepository, LineItemRepository,
  UuidV4Generator,
};
pub use reconcile::items_to_delete;
pub use services::{InvoiceData, InvoiceService, InvoiceServiceDependencies};
pub use value_objects::{
  CustomerName, DATE_FORMAT, InvoiceNumber, InvoiceStatus, ValueObjectError, format_date,
  parse_date,
};
