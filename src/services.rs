pub mod auth;
pub use auth::AuthService;
pub mod customer_service;
pub use customer_service::CustomerService;
pub mod invoice_service;
pub use invoice_service::InvoiceService;

use std::{future::Future, time::Duration};

use crate::common::error::AppError;

/// Runs a store call under `deadline`.
///
/// On expiry the store future is dropped; an open sqlx transaction inside it
/// is rolled back when its connection returns to the pool.
pub(crate) async fn with_deadline<T, F>(deadline: Duration, call: F) -> Result<T, AppError>
where
    F: Future<Output = Result<T, AppError>>,
{
    match tokio::time::timeout(deadline, call).await {
        Ok(result) => result,
        Err(_) => {
            tracing::error!("Store call exceeded its {:?} deadline", deadline);
            Err(AppError::StoreTimeout)
        }
    }
}
