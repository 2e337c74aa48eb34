use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::str::FromStr;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::info;

use cryptokey::{base32, rng, CryptoKey, Encoding, KeyType};

use crate::config::CONFIG_DEF;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    Info,
    Export,
    Sign,
    Verify,
    Encode,
    Decode,
    Token,
}

impl FromStr for RunMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "info" => Ok(RunMode::Info),
            "export" => Ok(RunMode::Export),
            "sign" => Ok(RunMode::Sign),
            "verify" => Ok(RunMode::Verify),
            "encode" => Ok(RunMode::Encode),
            "decode" => Ok(RunMode::Decode),
            "token" => Ok(RunMode::Token),
            _ => Err(format!(
                "unknown run mode `{}', available: info(default), export, sign, verify, encode, decode, token",
                s
            )),
        }
    }
}

#[derive(Debug, Parser)]
#[clap(version, about = "Inspect RSA keys, sign and verify data, and work with base32 text")]
pub struct Cli {
    #[clap(short, long, default_value = CONFIG_DEF.mode.as_str(), help = "Run mode")]
    pub mode: RunMode,
    #[clap(short, long, default_value = CONFIG_DEF.key.as_str(), help = "Key file")]
    pub key: String,
    #[clap(short = 't', long, default_value = CONFIG_DEF.key_type.as_str(), help = "Key type in the key file, or to export: public, private")]
    pub key_type: KeyType,
    #[clap(short, long, default_value = CONFIG_DEF.encoding.as_str(), help = "Key encoding: pem, der")]
    pub encoding: Encoding,
    #[clap(short, long, default_value = CONFIG_DEF.input.as_str(), help = "Input filename")]
    pub input: String,
    #[clap(short, long, default_value = CONFIG_DEF.output.as_str(), help = "Output filename")]
    pub output: String,
    #[clap(long, default_value = CONFIG_DEF.signature.as_str(), help = "Hex signature file to verify against")]
    pub signature: String,
    #[clap(short, long, default_value_t = CONFIG_DEF.length, help = "Random bytes in a generated token")]
    pub length: usize,
    #[clap(short, long, help = "Only log errors")]
    pub silent: bool,
}

impl Cli {
    fn read_input(&self) -> Result<Vec<u8>> {
        let mut data = Vec::new();
        match self.input.as_str() {
            "stdin" => {
                io::stdin().read_to_end(&mut data).context("reading stdin")?;
            }
            f => data = fs::read(f).with_context(|| format!("reading {}", f))?,
        }
        Ok(data)
    }

    fn writer(&self) -> Result<Box<dyn Write>> {
        Ok(match self.output.as_str() {
            "stdout" => Box::new(io::stdout()),
            f => Box::new(File::create(f).with_context(|| format!("creating {}", f))?),
        })
    }

    fn load_key(&self) -> Result<CryptoKey> {
        let data = fs::read(&self.key).with_context(|| format!("reading key {}", self.key))?;
        let key = CryptoKey::from_data(&data, self.key_type, self.encoding)
            .with_context(|| format!("loading {} {} key from {}", self.encoding, self.key_type, self.key))?;
        info!(path = %self.key, bits = key.bits(), private = key.is_private(), "key loaded");
        Ok(key)
    }

    /// Everything the mode writes, computed before the output is opened.
    fn produce(&self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        match self.mode {
            RunMode::Info => {
                let key = self.load_key()?;
                writeln!(out, "bits: {}", key.bits())?;
                writeln!(out, "private: {}", key.is_private())?;
                writeln!(out, "digest: {}", hex::encode(key.public_key_digest()?))?;
                writeln!(out, "identity: {}", key.network_identity()?)?;
            }
            RunMode::Export => {
                let key = self.load_key()?;
                let encoded = match self.key_type {
                    KeyType::PublicKey => key.encode_public_key(self.encoding)?,
                    KeyType::PrivateKey => key.encode_private_key(self.encoding)?,
                };
                out.write_all(&encoded)?;
            }
            RunMode::Sign => {
                let key = self.load_key()?;
                let signature = key.sign_data(&self.read_input()?)?;
                writeln!(out, "{}", hex::encode(signature))?;
            }
            RunMode::Verify => {
                let key = self.load_key()?;
                let text = fs::read_to_string(&self.signature)
                    .with_context(|| format!("reading signature {}", self.signature))?;
                let signature = hex::decode(text.trim()).context("signature is not hex")?;
                if !key.verify_data(&self.read_input()?, &signature) {
                    bail!("signature does not match");
                }
                writeln!(out, "signature ok")?;
            }
            RunMode::Encode => {
                writeln!(out, "{}", base32::encode(&self.read_input()?))?;
            }
            RunMode::Decode => {
                let input = self.read_input()?;
                let end = input.iter().rposition(|c| !c.is_ascii_whitespace()).map_or(0, |i| i + 1);
                let decoded = base32::decode(&input[..end])?;
                out.write_all(&decoded)?;
            }
            RunMode::Token => {
                writeln!(out, "{}", rng::random_token(self.length))?;
            }
        }
        Ok(out)
    }

    pub fn run(&self) -> Result<()> {
        let output = self.produce()?;
        let mut out = self.writer()?;
        out.write_all(&output)?;
        out.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALICE: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/data/alice.pem"));
    const ALICE_SIGNED_TEST_DATA: &str = "23fdcd5c7d40b44a7e49619d9048c81931166a0adb80c8981cc8f9a9e02c3923d5fba6d92ea03dc672d009a5fe1be2b582fb935076f880d9aa55511c33620d2aa23336b579dd7ccd1dbf4c845e4100a114d8ac20dd47229e876444f79d5152456a8e26fefa67a12436b3c33728a2ff7cb12250c486f786647574e48bb9208f64";
    const BOB: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/data/bob.pem"));

    #[test]
    fn test_parse_defaults() {
        let cli = Cli::parse_from(["cryptokey"]);
        assert_eq!(cli.mode, RunMode::Info);
        assert_eq!(cli.key_type, KeyType::PrivateKey);
        assert_eq!(cli.encoding, Encoding::Pem);
        assert_eq!(cli.length, 16);
        assert!(!cli.silent);
    }

    #[test]
    fn test_parse_modes() {
        let cli = Cli::parse_from(["cryptokey", "-m", "verify", "-t", "public", "-e", "der", "-s"]);
        assert_eq!(cli.mode, RunMode::Verify);
        assert_eq!(cli.key_type, KeyType::PublicKey);
        assert_eq!(cli.encoding, Encoding::Der);
        assert!(cli.silent);
        assert!(Cli::try_parse_from(["cryptokey", "-m", "generate"]).is_err());
    }

    struct Files {
        dir: tempfile::TempDir,
    }

    impl Files {
        fn new() -> Self {
            Self { dir: tempfile::tempdir().unwrap() }
        }

        fn write(&self, name: &str, data: &[u8]) -> String {
            let path = self.dir.path().join(name);
            fs::write(&path, data).unwrap();
            path.to_string_lossy().into_owned()
        }

        fn read(&self, name: &str) -> Vec<u8> {
            fs::read(self.dir.path().join(name)).unwrap()
        }
    }

    fn cli(args: &[&str]) -> Cli {
        Cli::parse_from(std::iter::once("cryptokey").chain(args.iter().copied()))
    }

    #[test]
    fn test_sign_then_verify() {
        let files = Files::new();
        let key = files.write("alice.pem", ALICE.as_bytes());
        let input = files.write("data.txt", b"test data");
        let signature = files.write("signature.hex", b"");
        cli(&["-m", "sign", "-k", &key, "-i", &input, "-o", &signature]).run().unwrap();
        assert_eq!(
            String::from_utf8(files.read("signature.hex")).unwrap().trim(),
            ALICE_SIGNED_TEST_DATA
        );

        let output = files.write("out.txt", b"");
        cli(&["-m", "verify", "-k", &key, "-i", &input, "--signature", &signature, "-o", &output])
            .run()
            .unwrap();
        assert_eq!(files.read("out.txt"), b"signature ok\n");
    }

    #[test]
    fn test_failed_verify_keeps_output() {
        let files = Files::new();
        let key = files.write("bob.pem", BOB.as_bytes());
        let input = files.write("data.txt", b"different");
        let signature = files.write("signature.hex", ALICE_SIGNED_TEST_DATA.as_bytes());
        let output = files.write("out.txt", b"keep");
        let result = cli(&[
            "-m", "verify", "-t", "public", "-k", &key, "-i", &input, "--signature", &signature, "-o", &output,
        ])
        .run();
        assert!(result.is_err());
        assert_eq!(files.read("out.txt"), b"keep");
    }

    #[test]
    fn test_failed_sign_keeps_output() {
        let files = Files::new();
        let key = files.write("bob.pem", BOB.as_bytes());
        let input = files.write("data.txt", b"test data");
        let output = files.write("out.txt", b"keep");
        // bob's key has no private half
        assert!(cli(&["-m", "sign", "-t", "public", "-k", &key, "-i", &input, "-o", &output]).run().is_err());
        let missing = files.dir.path().join("missing.pem").to_string_lossy().into_owned();
        assert!(cli(&["-m", "sign", "-k", &missing, "-i", &input, "-o", &output]).run().is_err());
        assert_eq!(files.read("out.txt"), b"keep");
    }
}
