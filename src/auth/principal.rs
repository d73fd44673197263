/// Authenticated identity attached to a request by the auth middleware
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Principal {
    pub id: String,
}

impl Principal {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}
