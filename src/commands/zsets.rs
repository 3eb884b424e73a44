//! Sorted set commands: ZADD, ZSCORE, ZRANK, ZCARD, ZREM.

use crate::commands::args::{format_score, parse_score};
use crate::commands::{CommandError, CommandSpec};
use crate::protocol::Reply;
use crate::storage::{Object, SortedSet, Store, Value};
use bytes::Bytes;

pub(crate) const COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        name: "ZADD",
        min_args: 3,
        max_args: None,
        handler: zadd,
    },
    CommandSpec {
        name: "ZSCORE",
        min_args: 2,
        max_args: Some(2),
        handler: zscore,
    },
    CommandSpec {
        name: "ZRANK",
        min_args: 2,
        max_args: Some(2),
        handler: zrank,
    },
    CommandSpec {
        name: "ZCARD",
        min_args: 1,
        max_args: Some(1),
        handler: zcard,
    },
    CommandSpec {
        name: "ZREM",
        min_args: 2,
        max_args: None,
        handler: zrem,
    },
];

/// Runs `f` against the live sorted set under `key`.
///
/// `Ok(None)` if the key does not exist.
fn with_zset<R>(
    store: &Store,
    key: &[u8],
    f: impl FnOnce(&SortedSet) -> R,
) -> Result<Option<R>, CommandError> {
    store.read(key, |obj| match obj.map(|o| &o.value) {
        None => Ok(None),
        Some(Value::SortedSet(zset)) => Ok(Some(f(zset))),
        Some(other) => Err(CommandError::wrong_type(other, "zset")),
    })
}

/// ZADD key score member [score member ...]
///
/// Every score is validated before the set is touched, so a bad score
/// leaves the key unchanged. Replies with the number of new members.
fn zadd(store: &Store, args: &[Bytes]) -> Result<Reply, CommandError> {
    let (key, rest) = (&args[0], &args[1..]);
    if rest.len() % 2 != 0 {
        return Err(CommandError::WrongArity("ZADD"));
    }

    let pairs = rest
        .chunks_exact(2)
        .map(|pair| Ok((parse_score(&pair[0])?, pair[1].clone())))
        .collect::<Result<Vec<_>, CommandError>>()?;

    let added = store.update(key, |slot| {
        let object = slot.get_or_insert_with(|| {
            Object::persistent(key.clone(), Value::SortedSet(SortedSet::new()))
        });
        let zset = match &mut object.value {
            Value::SortedSet(zset) => zset,
            other => return Err(CommandError::wrong_type(other, "zset")),
        };

        let mut added = 0;
        for (score, member) in pairs {
            if zset.add(member, score) {
                added += 1;
            }
        }
        Ok(added)
    })?;

    Ok(Reply::integer(added))
}

/// ZSCORE key member
fn zscore(store: &Store, args: &[Bytes]) -> Result<Reply, CommandError> {
    let score = with_zset(store, &args[0], |zset| zset.score(&args[1]))?.flatten();

    Ok(match score {
        Some(score) => Reply::bulk(format_score(score)),
        None => Reply::nil(),
    })
}

/// ZRANK key member
fn zrank(store: &Store, args: &[Bytes]) -> Result<Reply, CommandError> {
    let rank = with_zset(store, &args[0], |zset| zset.rank(&args[1]))?.flatten();

    Ok(match rank {
        Some(rank) => Reply::integer(rank as i64),
        None => Reply::nil(),
    })
}

/// ZCARD key
fn zcard(store: &Store, args: &[Bytes]) -> Result<Reply, CommandError> {
    let len = with_zset(store, &args[0], SortedSet::len)?.unwrap_or(0);
    Ok(Reply::integer(len as i64))
}

/// ZREM key member [member ...]
///
/// Removing the last member deletes the key.
fn zrem(store: &Store, args: &[Bytes]) -> Result<Reply, CommandError> {
    let removed = store.update(&args[0], |slot| {
        let zset = match slot.as_mut().map(|o| &mut o.value) {
            None => return Ok(0),
            Some(Value::SortedSet(zset)) => zset,
            Some(other) => return Err(CommandError::wrong_type(other, "zset")),
        };

        let removed = args[1..].iter().filter(|m| zset.remove(m)).count();
        if zset.is_empty() {
            *slot = None;
        }
        Ok(removed)
    })?;

    Ok(Reply::integer(removed as i64))
}
