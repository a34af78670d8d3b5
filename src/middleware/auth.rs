// The per-request scope threaded from auth middleware into handlers via
// request extensions.

#[derive(Debug, Clone)]
pub struct Principal {
    pub user_id: String,
    pub device_id: String,
}
