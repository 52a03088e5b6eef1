use tokio_util::sync::CancellationToken;

use crate::features::search::models::QuerySignature;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum RequestKind {
    Fresh,
    LoadMore,
}

/// Handed to the task that performs a request; `seq` comes back with the
/// response so the guard can tell whether it is still the latest.
#[derive(Debug)]
pub struct RequestTicket {
    pub seq: u64,
    pub kind: RequestKind,
    pub token: CancellationToken,
}

#[derive(Debug)]
struct Latest {
    seq: u64,
    kind: RequestKind,
    signature: Option<QuerySignature>,
    token: CancellationToken,
}

/// Last-request-wins bookkeeping.
///
/// Every issued request gets a strictly increasing sequence number and only a
/// response carrying the latest one is accepted. Transport cancellation of the
/// previous request is best effort; `accept` is what keeps stale data out.
#[derive(Debug, Default)]
pub struct RequestGuard {
    next_seq: u64,
    latest: Option<Latest>,
}

impl RequestGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when the latest request was a fresh search for the same
    /// signature, whether it is still in flight or already completed.
    pub fn is_duplicate(&self, signature: &QuerySignature) -> bool {
        matches!(
            &self.latest,
            Some(Latest {
                kind: RequestKind::Fresh,
                signature: Some(latest),
                ..
            }) if latest == signature
        )
    }

    pub fn issue(&mut self, kind: RequestKind, signature: QuerySignature) -> RequestTicket {
        self.cancel_latest();

        self.next_seq += 1;
        let token = CancellationToken::new();
        self.latest = Some(Latest {
            seq: self.next_seq,
            kind,
            signature: Some(signature),
            token: token.clone(),
        });

        RequestTicket {
            seq: self.next_seq,
            kind,
            token,
        }
    }

    pub fn accept(&self, seq: u64) -> bool {
        self.latest.as_ref().is_some_and(|latest| latest.seq == seq)
    }

    /// Stop de-duplicating against the latest request, e.g. after it failed,
    /// so the same query can be sent again.
    pub fn forget_signature(&mut self) {
        if let Some(latest) = self.latest.as_mut() {
            latest.signature = None;
        }
    }

    pub fn cancel_latest(&mut self) {
        if let Some(latest) = self.latest.as_ref() {
            latest.token.cancel();
        }
    }

    /// Cancel and invalidate the latest request; its response will be dropped.
    pub fn abandon(&mut self) {
        self.cancel_latest();
        self.latest = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signature(value: &str) -> QuerySignature {
        QuerySignature::from(value)
    }

    #[test]
    fn sequence_numbers_increase_and_only_latest_is_accepted() {
        let mut guard = RequestGuard::new();
        let a = guard.issue(RequestKind::Fresh, signature("search=a"));
        let b = guard.issue(RequestKind::Fresh, signature("search=b"));

        assert!(b.seq > a.seq);
        assert!(!guard.accept(a.seq));
        assert!(guard.accept(b.seq));
    }

    #[test]
    fn issuing_cancels_previous_token() {
        let mut guard = RequestGuard::new();
        let a = guard.issue(RequestKind::LoadMore, signature("search=a"));
        assert!(!a.token.is_cancelled());

        let b = guard.issue(RequestKind::Fresh, signature("search=b"));
        assert!(a.token.is_cancelled());
        assert!(!b.token.is_cancelled());
    }

    #[test]
    fn duplicate_only_against_latest_fresh_search() {
        let mut guard = RequestGuard::new();
        assert!(!guard.is_duplicate(&signature("search=a")));

        guard.issue(RequestKind::Fresh, signature("search=a"));
        assert!(guard.is_duplicate(&signature("search=a")));
        assert!(!guard.is_duplicate(&signature("search=b")));

        guard.issue(RequestKind::LoadMore, signature("search=a"));
        assert!(!guard.is_duplicate(&signature("search=a")));
    }

    #[test]
    fn forgotten_signature_is_no_longer_a_duplicate() {
        let mut guard = RequestGuard::new();
        let ticket = guard.issue(RequestKind::Fresh, signature("search=a"));
        guard.forget_signature();

        assert!(!guard.is_duplicate(&signature("search=a")));
        assert!(guard.accept(ticket.seq));
    }

    #[test]
    fn abandon_rejects_everything() {
        let mut guard = RequestGuard::new();
        let ticket = guard.issue(RequestKind::Fresh, signature("search=a"));
        guard.abandon();

        assert!(ticket.token.is_cancelled());
        assert!(!guard.accept(ticket.seq));
        assert!(!guard.is_duplicate(&signature("search=a")));
    }
}
