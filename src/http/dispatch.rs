//! URL verb dispatch.
//!
//! Handlers are registered under a *verb*, the text the request path must
//! start with once the URL prefix and a leading `/` are removed. Matching is by
//! prefix and the first registered match wins, so register longer verbs that
//! share a prefix with shorter ones first:
//!
//! ```rust
//! use microweb::http::{CommandTable, Route};
//!
//! let mut table: CommandTable<char, 4> = CommandTable::new();
//! table.add("status.json", 's').unwrap();
//! table.add("led", 'l').unwrap();
//!
//! match table.route::<4>("/led/on?level=3") {
//!     Route::Command { handler, tail } => {
//!         assert_eq!(handler, 'l');
//!         assert_eq!(tail, "/on?level=3");
//!     }
//!     _ => unreachable!(),
//! }
//! ```

use super::error::Error;
use heapless::Vec;

/// Where a request path leads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route<'u, F, const S: usize> {
    /// Empty path, `/`, or a bare query string. `tail` is the query, if any.
    Default {
        /// The query string without its `?`.
        tail: &'u str,
    },
    /// A registered verb matched.
    Command {
        /// The handler registered for the verb.
        handler: F,
        /// Whatever followed the verb, a `?` right after it removed.
        tail: &'u str,
    },
    /// No verb matched. The path split on `/`, for the path handler.
    Segments {
        /// Non-empty path segments, at most `S`; further ones are dropped.
        segments: Vec<&'u str, S>,
        /// The query string without its `?`.
        tail: &'u str,
    },
}

/// Fixed-capacity table of `(verb, handler)` pairs.
#[derive(Debug, Clone)]
pub struct CommandTable<F: Copy, const N: usize> {
    entries: Vec<(&'static str, F), N>,
}

impl<F: Copy, const N: usize> Default for CommandTable<F, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: Copy, const N: usize> CommandTable<F, N> {
    /// An empty table.
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Register `handler` under `verb`, after every earlier registration.
    pub fn add(&mut self, verb: &'static str, handler: F) -> Result<(), Error> {
        self.entries
            .push((verb, handler))
            .map_err(|_| Error::CommandTableFull)?;
        debug!("registered command {}", verb);
        Ok(())
    }

    /// Number of registered verbs.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolve a path, already stripped of the URL prefix.
    pub fn route<'u, const S: usize>(&self, path: &'u str) -> Route<'u, F, S> {
        let path = path.strip_prefix('/').unwrap_or(path);
        if path.is_empty() {
            return Route::Default { tail: "" };
        }
        if let Some(query) = path.strip_prefix('?') {
            return Route::Default { tail: query };
        }

        let (resource, query) = match path.split_once('?') {
            Some((resource, query)) => (resource, query),
            None => (path, ""),
        };

        if let Some(&(verb, handler)) = self
            .entries
            .iter()
            .find(|(verb, _)| resource.starts_with(verb))
        {
            let tail = &path[verb.len()..];
            return Route::Command {
                handler,
                tail: tail.strip_prefix('?').unwrap_or(tail),
            };
        }

        let mut segments = Vec::new();
        for segment in resource.split('/').filter(|s| !s.is_empty()) {
            if segments.push(segment).is_err() {
                break;
            }
        }
        Route::Segments {
            segments,
            tail: query,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> CommandTable<u8, 4> {
        let mut table = CommandTable::new();
        table.add("foo", 1).unwrap();
        table.add("a", 2).unwrap();
        table.add("abc", 3).unwrap();
        table
    }

    #[test]
    fn test_default_routes() {
        let table = table();
        assert_eq!(table.route::<4>(""), Route::Default { tail: "" });
        assert_eq!(table.route::<4>("/"), Route::Default { tail: "" });
        assert_eq!(table.route::<4>("/?q=1"), Route::Default { tail: "q=1" });
        assert_eq!(table.route::<4>("?q=1"), Route::Default { tail: "q=1" });
    }

    #[test]
    fn test_verb_with_path_and_query() {
        let table = table();
        assert_eq!(
            table.route::<4>("foo/bar?x=1"),
            Route::Command {
                handler: 1,
                tail: "/bar?x=1"
            }
        );
        assert_eq!(
            table.route::<4>("/foo?x=1"),
            Route::Command {
                handler: 1,
                tail: "x=1"
            }
        );
        assert_eq!(
            table.route::<4>("/foo"),
            Route::Command { handler: 1, tail: "" }
        );
    }

    #[test]
    fn test_prefix_match_first_wins() {
        let table = table();
        // "a" was registered before "abc" and shadows it
        assert_eq!(
            table.route::<4>("/abc"),
            Route::Command {
                handler: 2,
                tail: "bc"
            }
        );
    }

    #[test]
    fn test_verb_only_matches_path_portion() {
        let table = table();
        match table.route::<4>("/x?foo") {
            Route::Segments { segments, tail } => {
                assert_eq!(&segments[..], ["x"]);
                assert_eq!(tail, "foo");
            }
            other => panic!("unexpected route {:?}", other),
        }
    }

    #[test]
    fn test_segments_truncated() {
        let table = table();
        match table.route::<2>("/x/y/z/?k=v") {
            Route::Segments { segments, tail } => {
                assert_eq!(&segments[..], ["x", "y"]);
                assert_eq!(tail, "k=v");
            }
            other => panic!("unexpected route {:?}", other),
        }
    }

    #[test]
    fn test_table_full() {
        let mut table: CommandTable<u8, 1> = CommandTable::new();
        table.add("one", 1).unwrap();
        assert_eq!(table.add("two", 2), Err(Error::CommandTableFull));
        assert_eq!(table.len(), 1);
    }
}
