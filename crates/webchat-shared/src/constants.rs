/// Cookie carrying the registered display name.
pub const IDENTITY_COOKIE: &str = "username";

/// Display name used when registration omits one.
pub const DEFAULT_USERNAME: &str = "Anonymous";

/// Identity cookie lifetime in days.
pub const IDENTITY_COOKIE_DAYS: i64 = 365;

/// Reply body of `/get_clients` when the listing is switched off.
pub const CLIENTS_DISABLED_BODY: &str = "Endpoint disabled";

/// Indentation unit used for every JSON document the server emits.
pub const JSON_INDENT: &[u8] = b" ";
