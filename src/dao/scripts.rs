/// Delete a key only while it still holds the expected value.
///
/// KEYS\[1\] = the key
/// ARGV\[1\] = expected value
///
/// Returns the DEL count (1) on a match, 0 otherwise.
pub const COMPARE_AND_DEL: &str = r#"
if redis.call("get", KEYS[1]) == ARGV[1] then
    return redis.call("del", KEYS[1])
else
    return 0
end
"#;

/// Overwrite a key only while it still holds the expected value.
///
/// KEYS\[1\] = the key
/// ARGV\[1\] = expected value
/// ARGV\[2\] = new value
///
/// Returns the SET status reply (`OK`) on a match, 0 otherwise.
pub const COMPARE_AND_UPDATE: &str = r#"
if redis.call("get", KEYS[1]) == ARGV[1] then
    return redis.call("set", KEYS[1], ARGV[2])
else
    return 0
end
"#;

/// Re-write a key with a fresh expiry while it still holds the expected value.
///
/// KEYS\[1\] = the key
/// ARGV\[1\] = expected value
/// ARGV\[2\] = expiry unit, `EX` (seconds) or `PX` (milliseconds)
/// ARGV\[3\] = expiry amount
///
/// Returns 1 on a match, 0 otherwise.
pub const COMPARE_AND_REFRESH: &str = r#"
if redis.call("get", KEYS[1]) == ARGV[1] then
    redis.call("set", KEYS[1], ARGV[1], ARGV[2], ARGV[3])
    return 1
else
    return 0
end
"#;
