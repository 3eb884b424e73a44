//! String commands: SET, GET.

use crate::commands::args::parse_integer;
use crate::commands::{CommandError, CommandSpec};
use crate::protocol::Reply;
use crate::storage::{Object, Store, Value};
use bytes::Bytes;

pub(crate) const COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        name: "SET",
        min_args: 2,
        max_args: Some(4),
        handler: set,
    },
    CommandSpec {
        name: "GET",
        min_args: 1,
        max_args: Some(1),
        handler: get,
    },
];

/// SET key value [option ttl-seconds]
///
/// The third argument is an option slot that is accepted but not
/// interpreted (clients send `EX` there); the TTL is always the fourth. A
/// negative TTL stores the key without expiry. SET replaces whatever the
/// key held before, including its TTL and its type.
fn set(store: &Store, args: &[Bytes]) -> Result<Reply, CommandError> {
    if args.len() == 3 {
        return Err(CommandError::WrongArity("SET"));
    }

    let ttl_ms = match args.get(3) {
        Some(raw) => parse_integer(raw)?
            .checked_mul(1000)
            .ok_or(CommandError::NotInteger)?,
        None => -1,
    };

    let key = args[0].clone();
    let object = Object::new(key.clone(), Value::Str(args[1].clone()), ttl_ms);
    store.set(key, object);

    Ok(Reply::ok())
}

/// GET key
fn get(store: &Store, args: &[Bytes]) -> Result<Reply, CommandError> {
    store.read(&args[0], |obj| match obj.map(|o| &o.value) {
        None => Ok(Reply::nil()),
        Some(Value::Str(data)) => Ok(Reply::bulk(data.clone())),
        Some(other) => Err(CommandError::wrong_type(other, "string")),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{Expiry, SortedSet};

    fn args(parts: &[&str]) -> Vec<Bytes> {
        parts.iter().map(|s| Bytes::from(s.to_string())).collect()
    }

    #[test]
    fn test_set_get() {
        let store = Store::new();

        assert_eq!(set(&store, &args(&["name", "tish"])), Ok(Reply::ok()));
        assert_eq!(
            get(&store, &args(&["name"])),
            Ok(Reply::bulk(Bytes::from("tish")))
        );
        assert_eq!(store.get_expiry(b"name"), Expiry::Persistent);
    }

    #[test]
    fn test_get_missing() {
        let store = Store::new();
        assert_eq!(get(&store, &args(&["nope"])), Ok(Reply::nil()));
    }

    #[test]
    fn test_set_overwrites() {
        let store = Store::new();

        set(&store, &args(&["k", "one", "EX", "100"])).unwrap();
        set(&store, &args(&["k", "two"])).unwrap();

        assert_eq!(get(&store, &args(&["k"])), Ok(Reply::bulk(Bytes::from("two"))));
        assert_eq!(store.get_expiry(b"k"), Expiry::Persistent);
    }

    #[test]
    fn test_set_with_ttl() {
        let store = Store::new();

        set(&store, &args(&["k", "v", "EX", "10"])).unwrap();

        match store.get_expiry(b"k") {
            Expiry::At(at) => {
                let remain = at.saturating_sub(crate::storage::now_ms());
                assert!(remain > 9_000 && remain <= 10_000);
            }
            other => panic!("unexpected expiry {:?}", other),
        }
    }

    #[test]
    fn test_set_option_slot_is_ignored() {
        let store = Store::new();

        set(&store, &args(&["k", "v", "anything", "10"])).unwrap();
        assert!(matches!(store.get_expiry(b"k"), Expiry::At(_)));
    }

    #[test]
    fn test_set_negative_ttl_is_persistent() {
        let store = Store::new();

        set(&store, &args(&["k", "v", "EX", "-5"])).unwrap();
        assert_eq!(store.get_expiry(b"k"), Expiry::Persistent);
    }

    #[test]
    fn test_set_zero_ttl_is_already_expired() {
        let store = Store::new();

        set(&store, &args(&["k", "v", "EX", "0"])).unwrap();
        assert_eq!(get(&store, &args(&["k"])), Ok(Reply::nil()));
    }

    #[test]
    fn test_set_three_args_is_arity_error() {
        let store = Store::new();

        assert_eq!(
            set(&store, &args(&["k", "v", "EX"])),
            Err(CommandError::WrongArity("SET"))
        );
        assert!(!store.exists(b"k"));
    }

    #[test]
    fn test_set_bad_ttl() {
        let store = Store::new();

        assert_eq!(
            set(&store, &args(&["k", "v", "EX", "ten"])),
            Err(CommandError::NotInteger)
        );
        assert_eq!(
            set(&store, &args(&["k", "v", "EX", "9223372036854775807"])),
            Err(CommandError::NotInteger)
        );
        assert!(!store.exists(b"k"));
    }

    #[test]
    fn test_get_wrong_type() {
        let store = Store::new();
        let key = Bytes::from("z");
        store.set(
            key.clone(),
            Object::persistent(key, Value::SortedSet(SortedSet::new())),
        );

        assert_eq!(get(&store, &args(&["z"])), Err(CommandError::WrongType));
    }
}
