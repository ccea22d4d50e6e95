//! Merge iterator over a v0/v1 table pair.
//!
//! Yields entries in combined byte-lexicographic key order. On equal keys the
//! v1 cursor wins, so records migrated to the newer epoch shadow any stale
//! v0 twin.

use crate::StoreError;

type Entry = Result<(Vec<u8>, Vec<u8>), StoreError>;

/// Small state machine over two ordered cursors, advancing whichever holds
/// the smaller current key.
pub struct MergedIter<I0, I1> {
    v0: I0,
    v1: I1,
    head_v0: Option<(Vec<u8>, Vec<u8>)>,
    head_v1: Option<(Vec<u8>, Vec<u8>)>,
    failed: bool,
}

impl<'txn, I0, I1> MergedIter<I0, I1>
where
    I0: Iterator<Item = heed::Result<(&'txn [u8], &'txn [u8])>>,
    I1: Iterator<Item = heed::Result<(&'txn [u8], &'txn [u8])>>,
{
    pub fn new(v0: I0, v1: I1) -> Self {
        Self {
            v0,
            v1,
            head_v0: None,
            head_v1: None,
            failed: false,
        }
    }

    fn refill(&mut self) -> Result<(), StoreError> {
        if self.head_v0.is_none() {
            if let Some(item) = self.v0.next() {
                let (k, v) = item?;
                self.head_v0 = Some((k.to_vec(), v.to_vec()));
            }
        }
        if self.head_v1.is_none() {
            if let Some(item) = self.v1.next() {
                let (k, v) = item?;
                self.head_v1 = Some((k.to_vec(), v.to_vec()));
            }
        }
        Ok(())
    }
}

impl<'txn, I0, I1> Iterator for MergedIter<I0, I1>
where
    I0: Iterator<Item = heed::Result<(&'txn [u8], &'txn [u8])>>,
    I1: Iterator<Item = heed::Result<(&'txn [u8], &'txn [u8])>>,
{
    type Item = Entry;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        if let Err(e) = self.refill() {
            self.failed = true;
            return Some(Err(e));
        }
        match (&self.head_v0, &self.head_v1) {
            (None, None) => None,
            (Some(_), None) => self.head_v0.take().map(Ok),
            (None, Some(_)) => self.head_v1.take().map(Ok),
            (Some((k0, _)), Some((k1, _))) => {
                if k0 < k1 {
                    self.head_v0.take().map(Ok)
                } else if k1 < k0 {
                    self.head_v1.take().map(Ok)
                } else {
                    // Equal keys: the newer epoch shadows the older record.
                    self.head_v0 = None;
                    self.head_v1.take().map(Ok)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn iter_of(
        entries: &'static [(&'static [u8], &'static [u8])],
    ) -> impl Iterator<Item = heed::Result<(&'static [u8], &'static [u8])>> {
        entries.iter().map(|&(k, v)| Ok((k, v)))
    }

    #[test]
    fn interleaves_in_key_order() {
        let v0: &[(&[u8], &[u8])] = &[(b"a", b"0"), (b"c", b"0")];
        let v1: &[(&[u8], &[u8])] = &[(b"b", b"1"), (b"d", b"1")];
        let merged: Vec<_> = MergedIter::new(iter_of(v0), iter_of(v1))
            .map(|r| r.unwrap())
            .collect();
        let keys: Vec<&[u8]> = merged.iter().map(|(k, _)| k.as_slice()).collect();
        assert_eq!(keys, vec![b"a".as_slice(), b"b", b"c", b"d"]);
    }

    #[test]
    fn equal_keys_prefer_v1() {
        let v0: &[(&[u8], &[u8])] = &[(b"a", b"old")];
        let v1: &[(&[u8], &[u8])] = &[(b"a", b"new")];
        let merged: Vec<_> = MergedIter::new(iter_of(v0), iter_of(v1))
            .map(|r| r.unwrap())
            .collect();
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].1, b"new");
    }

    #[test]
    fn one_side_empty() {
        let v0: &[(&[u8], &[u8])] = &[];
        let v1: &[(&[u8], &[u8])] = &[(b"x", b"1")];
        let merged: Vec<_> = MergedIter::new(iter_of(v0), iter_of(v1))
            .map(|r| r.unwrap())
            .collect();
        assert_eq!(merged.len(), 1);
    }
}
