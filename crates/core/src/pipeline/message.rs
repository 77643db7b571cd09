use std::fmt;

#[derive(Clone, Debug)]
pub struct Message<T> {
    pub payload: T,
    pub branch: Option<usize>, // Worker that relayed the message, if any
}

impl<T: fmt::Display> fmt::Display for Message<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.branch {
            Some(branch) => write!(f, "{}@{}", self.payload, branch),
            None => write!(f, "{}", self.payload),
        }
    }
}

impl<T> Message<T> {
    pub fn new(payload: T) -> Self {
        Message { payload, branch: None }
    }

    pub fn with_branch(mut self, branch: usize) -> Self {
        self.branch = Some(branch);
        self
    }
}

pub(crate) fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
