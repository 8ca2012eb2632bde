// Billing display: the credits badge and the pricing table. Accounting itself
// happens in the backend and at the checkout provider.

pub mod credits;
pub mod pricing;
