//! Typed record access over a [`Stub`].
//!
//! The only place repositories touch raw keys and bytes.

use ubl_store::Stub;
use ubl_types::{KeySpace, Record};

use crate::error::{LedgerError, LedgerResult};

/// Read and decode the record `id` of type `R`, if present.
pub(crate) fn read<R, S>(stub: &mut S, id: &str) -> LedgerResult<Option<R>>
where
    R: Record,
    S: Stub + ?Sized,
{
    let key = R::SPACE.key(id)?;
    match stub.get_state(key.as_str())? {
        None => Ok(None),
        Some(bytes) => R::decode(&bytes)
            .map(Some)
            .map_err(|e| LedgerError::Decode {
                kind: R::SPACE,
                key: key.to_string(),
                reason: e.to_string(),
            }),
    }
}

/// Read the record `id`, failing with `NotFound` if absent.
pub(crate) fn require<R, S>(stub: &mut S, id: &str) -> LedgerResult<R>
where
    R: Record,
    S: Stub + ?Sized,
{
    read(stub, id)?.ok_or_else(|| LedgerError::not_found(R::SPACE, id))
}

/// Encode and stage a write of `record` under its own key.
pub(crate) fn write<R, S>(stub: &mut S, record: &R) -> LedgerResult<()>
where
    R: Record,
    S: Stub + ?Sized,
{
    let key = record.record_key()?;
    let bytes = record.encode().map_err(|e| LedgerError::Encode {
        kind: R::SPACE,
        key: key.to_string(),
        reason: e.to_string(),
    })?;
    stub.put_state(key.as_str(), bytes)?;
    Ok(())
}

pub(crate) fn exists<S>(stub: &mut S, space: KeySpace, id: &str) -> LedgerResult<bool>
where
    S: Stub + ?Sized,
{
    let key = space.key(id)?;
    Ok(stub.get_state(key.as_str())?.is_some())
}

pub(crate) fn remove<S>(stub: &mut S, space: KeySpace, id: &str) -> LedgerResult<()>
where
    S: Stub + ?Sized,
{
    let key = space.key(id)?;
    stub.del_state(key.as_str())?;
    Ok(())
}

/// Decode every record in `R`'s key space, in key order.
///
/// Only `R`'s prefix range is scanned, so records of other spaces are never
/// decoded as `R`.
pub(crate) fn scan<R, S>(stub: &mut S) -> LedgerResult<Vec<R>>
where
    R: Record,
    S: Stub + ?Sized,
{
    let (start, end) = R::SPACE.range();
    stub.get_state_by_range(&start, &end)?
        .into_iter()
        .map(|kv| {
            R::decode(&kv.value).map_err(|e| LedgerError::Decode {
                kind: R::SPACE,
                key: kv.key,
                reason: e.to_string(),
            })
        })
        .collect()
}
