//! Connection and keyspace commands: PING, TTL, DEL, EXISTS.

use crate::commands::{CommandError, CommandSpec};
use crate::protocol::Reply;
use crate::storage::{now_ms, Expiry, Store};
use bytes::Bytes;

/// TTL reply for a key that does not exist (or has expired)
pub const TTL_KEY_NOT_EXIST: i64 = -2;

/// TTL reply for a key stored without an expiry
pub const TTL_NO_EXPIRE: i64 = -1;

pub(crate) const COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        name: "PING",
        min_args: 0,
        max_args: Some(1),
        handler: ping,
    },
    CommandSpec {
        name: "TTL",
        min_args: 1,
        max_args: Some(1),
        handler: ttl,
    },
    CommandSpec {
        name: "DEL",
        min_args: 1,
        max_args: None,
        handler: del,
    },
    CommandSpec {
        name: "EXISTS",
        min_args: 1,
        max_args: None,
        handler: exists,
    },
];

/// PING [message]
///
/// Replies `+PONG`, or echoes the message as a bulk string.
fn ping(_store: &Store, args: &[Bytes]) -> Result<Reply, CommandError> {
    Ok(match args.first() {
        Some(message) => Reply::bulk(message.clone()),
        None => Reply::pong(),
    })
}

/// TTL key
///
/// Remaining lifetime in whole seconds, rounded down.
fn ttl(store: &Store, args: &[Bytes]) -> Result<Reply, CommandError> {
    let seconds = match store.get_expiry(&args[0]) {
        Expiry::Missing => TTL_KEY_NOT_EXIST,
        Expiry::Persistent => TTL_NO_EXPIRE,
        Expiry::At(at) => match at.saturating_sub(now_ms()) {
            // Past or exactly at its deadline: treat as gone even if the
            // sweeper has not reclaimed it yet.
            0 => TTL_KEY_NOT_EXIST,
            remain_ms => (remain_ms / 1000) as i64,
        },
    };

    Ok(Reply::integer(seconds))
}

/// DEL key [key ...]
fn del(store: &Store, args: &[Bytes]) -> Result<Reply, CommandError> {
    let deleted = args.iter().filter(|key| store.delete(key)).count();
    Ok(Reply::integer(deleted as i64))
}

/// EXISTS key [key ...]
///
/// A key named twice is counted twice.
fn exists(store: &Store, args: &[Bytes]) -> Result<Reply, CommandError> {
    let found = args.iter().filter(|key| store.exists(key)).count();
    Ok(Reply::integer(found as i64))
}
