//! Set commands: SADD, SREM, SMEMBERS, SISMEMBER, SCARD.

use crate::commands::{CommandError, CommandSpec};
use crate::protocol::Reply;
use crate::storage::{MemberSet, Object, Store, Value};
use bytes::Bytes;

pub(crate) const COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        name: "SADD",
        min_args: 2,
        max_args: None,
        handler: sadd,
    },
    CommandSpec {
        name: "SREM",
        min_args: 2,
        max_args: None,
        handler: srem,
    },
    CommandSpec {
        name: "SMEMBERS",
        min_args: 1,
        max_args: Some(1),
        handler: smembers,
    },
    CommandSpec {
        name: "SISMEMBER",
        min_args: 2,
        max_args: Some(2),
        handler: sismember,
    },
    CommandSpec {
        name: "SCARD",
        min_args: 1,
        max_args: Some(1),
        handler: scard,
    },
];

fn with_set<R>(
    store: &Store,
    key: &[u8],
    f: impl FnOnce(&MemberSet) -> R,
) -> Result<Option<R>, CommandError> {
    store.read(key, |obj| match obj.map(|o| &o.value) {
        None => Ok(None),
        Some(Value::Set(set)) => Ok(Some(f(set))),
        Some(other) => Err(CommandError::wrong_type(other, "set")),
    })
}

/// SADD key member [member ...]
///
/// Replies with the number of members that were not already present.
fn sadd(store: &Store, args: &[Bytes]) -> Result<Reply, CommandError> {
    let key = &args[0];

    let added = store.update(key, |slot| {
        let object = slot
            .get_or_insert_with(|| Object::persistent(key.clone(), Value::Set(MemberSet::new())));
        let set = match &mut object.value {
            Value::Set(set) => set,
            other => return Err(CommandError::wrong_type(other, "set")),
        };

        Ok(args[1..]
            .iter()
            .filter(|member| set.add((*member).clone()))
            .count())
    })?;

    Ok(Reply::integer(added as i64))
}

/// SREM key member [member ...]
///
/// Removing the last member deletes the key.
fn srem(store: &Store, args: &[Bytes]) -> Result<Reply, CommandError> {
    let removed = store.update(&args[0], |slot| {
        let set = match slot.as_mut().map(|o| &mut o.value) {
            None => return Ok(0),
            Some(Value::Set(set)) => set,
            Some(other) => return Err(CommandError::wrong_type(other, "set")),
        };

        let removed = args[1..].iter().filter(|m| set.remove(m)).count();
        if set.is_empty() {
            *slot = None;
        }
        Ok(removed)
    })?;

    Ok(Reply::integer(removed as i64))
}

/// SMEMBERS key
///
/// Members are returned in ascending byte order.
fn smembers(store: &Store, args: &[Bytes]) -> Result<Reply, CommandError> {
    let members = with_set(store, &args[0], |set| {
        set.iter().cloned().map(Reply::Bulk).collect()
    })?;

    Ok(Reply::array(members.unwrap_or_default()))
}

/// SISMEMBER key member
fn sismember(store: &Store, args: &[Bytes]) -> Result<Reply, CommandError> {
    let found = with_set(store, &args[0], |set| set.contains(&args[1]))?.unwrap_or(false);
    Ok(Reply::integer(found as i64))
}

/// SCARD key
fn scard(store: &Store, args: &[Bytes]) -> Result<Reply, CommandError> {
    let len = with_set(store, &args[0], MemberSet::len)?.unwrap_or(0);
    Ok(Reply::integer(len as i64))
}
