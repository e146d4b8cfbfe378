//! Line command handler for the interactive session

use std::fmt;

use lrucache::LruCache;

/// Reply to one command line
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Ok,
    Nil,
    Integer(i64),
    Keys(Vec<i64>),
    Text(String),
    Error(String),
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reply::Ok => f.write_str("OK"),
            Reply::Nil => f.write_str("(nil)"),
            Reply::Integer(n) => write!(f, "{n}"),
            Reply::Keys(keys) if keys.is_empty() => f.write_str("(empty)"),
            Reply::Keys(keys) => {
                let keys: Vec<String> = keys.iter().map(i64::to_string).collect();
                f.write_str(&keys.join(" "))
            }
            Reply::Text(text) => f.write_str(text),
            Reply::Error(msg) => write!(f, "ERR {msg}"),
        }
    }
}

pub struct CommandHandler {
    cache: LruCache<i64, i64>,
}

impl CommandHandler {
    pub fn new(cache: LruCache<i64, i64>) -> Self {
        Self { cache }
    }

    pub fn handle(&mut self, line: &str) -> Reply {
        let mut parts = line.split_whitespace();
        let command = match parts.next() {
            Some(cmd) => cmd.to_uppercase(),
            None => return Reply::Error("empty command".to_string()),
        };
        let args: Vec<&str> = parts.collect();

        match command.as_str() {
            "PING" => Reply::Text("PONG".to_string()),
            "GET" => self.handle_get(&args),
            "PEEK" => self.handle_peek(&args),
            "PUT" | "SET" => self.handle_put(&args),
            "DEL" => self.handle_del(&args),
            "EXISTS" => self.handle_exists(&args),
            "LEN" => Reply::Integer(self.cache.len() as i64),
            "CAP" => Reply::Integer(self.cache.capacity() as i64),
            "KEYS" => Reply::Keys(self.cache.keys().copied().collect()),
            "STATS" => self.handle_stats(),
            "CLEAR" => {
                self.cache.clear();
                Reply::Ok
            }
            _ => Reply::Error(format!("unknown command '{}'", command)),
        }
    }

    fn handle_get(&mut self, args: &[&str]) -> Reply {
        let key = match single_key("get", args) {
            Ok(key) => key,
            Err(reply) => return reply,
        };

        match self.cache.get(&key) {
            Some(&value) => Reply::Integer(value),
            None => Reply::Nil,
        }
    }

    fn handle_peek(&self, args: &[&str]) -> Reply {
        let key = match single_key("peek", args) {
            Ok(key) => key,
            Err(reply) => return reply,
        };

        match self.cache.peek(&key) {
            Some(&value) => Reply::Integer(value),
            None => Reply::Nil,
        }
    }

    fn handle_put(&mut self, args: &[&str]) -> Reply {
        if args.len() != 2 {
            return Reply::Error("wrong number of arguments for 'put' command".to_string());
        }

        let (key, value) = match (parse_int(args[0]), parse_int(args[1])) {
            (Ok(key), Ok(value)) => (key, value),
            (Err(reply), _) | (_, Err(reply)) => return reply,
        };

        self.cache.put(key, value);
        Reply::Ok
    }

    fn handle_del(&mut self, args: &[&str]) -> Reply {
        if args.is_empty() {
            return Reply::Error("wrong number of arguments for 'del' command".to_string());
        }

        let mut deleted = 0i64;
        for arg in args {
            match parse_int(arg) {
                Ok(key) => {
                    if self.cache.remove(&key).is_some() {
                        deleted += 1;
                    }
                }
                Err(reply) => return reply,
            }
        }

        Reply::Integer(deleted)
    }

    fn handle_exists(&self, args: &[&str]) -> Reply {
        if args.is_empty() {
            return Reply::Error("wrong number of arguments for 'exists' command".to_string());
        }

        let mut count = 0i64;
        for arg in args {
            match parse_int(arg) {
                Ok(key) => {
                    if self.cache.contains(&key) {
                        count += 1;
                    }
                }
                Err(reply) => return reply,
            }
        }

        Reply::Integer(count)
    }

    fn handle_stats(&self) -> Reply {
        match serde_json::to_string(&self.cache.stats().snapshot()) {
            Ok(json) => Reply::Text(json),
            Err(e) => Reply::Error(e.to_string()),
        }
    }
}

fn single_key(command: &str, args: &[&str]) -> Result<i64, Reply> {
    match args {
        [key] => parse_int(key),
        _ => Err(Reply::Error(format!(
            "wrong number of arguments for '{}' command",
            command
        ))),
    }
}

fn parse_int(arg: &str) -> Result<i64, Reply> {
    arg.parse()
        .map_err(|_| Reply::Error(format!("value is not an integer: '{}'", arg)))
}
