use lazy_static::lazy_static;

/// Defaults for the command line front end.
#[derive(Debug, Clone)]
pub struct Config {
    pub mode: String,
    pub key: String,
    pub key_type: String,
    pub encoding: String,
    pub input: String,
    pub output: String,
    pub signature: String,
    pub length: usize,
    pub silent: bool,
}

lazy_static! {
    pub static ref CONFIG_DEF: Config = Config {
        mode: String::from("info"),
        key: String::from("key.pem"),
        key_type: String::from("private"),
        encoding: String::from("pem"),
        input: String::from("stdin"),
        output: String::from("stdout"),
        signature: String::from("signature.hex"),
        length: 16,
        silent: false,
    };
}
