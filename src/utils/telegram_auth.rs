use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::collections::BTreeMap;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

const SECRET_KEY_LABEL: &[u8] = b"WebAppData";
const HASH_KEY: &str = "hash";

/// Init data handed to a mini-app by the Telegram client.
///
/// Values are kept exactly as they appear in the raw blob: the signature is
/// computed over the undecoded text, so nothing here unescapes them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InitData {
    fields: BTreeMap<String, String>,
    hash: String,
}

impl InitData {
    /// Splits `raw` into `key=value` segments on `&`. Only the first `=` of a
    /// segment separates key from value, segments without `=` are skipped and
    /// the last occurrence of a repeated key wins. Never fails.
    pub fn parse(raw: &str) -> Self {
        let mut fields: BTreeMap<String, String> = raw
            .split('&')
            .filter_map(|pair| pair.split_once('='))
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();

        let hash = fields.remove(HASH_KEY).unwrap_or_default();

        Self { fields, hash }
    }

    pub fn fields(&self) -> &BTreeMap<String, String> {
        &self.fields
    }

    pub fn into_fields(self) -> BTreeMap<String, String> {
        self.fields
    }

    pub fn hash(&self) -> &str {
        &self.hash
    }

    /// Every field except `hash`, sorted by key, one `key=value` per line.
    pub fn data_check_string(&self) -> String {
        self.fields
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn verify(&self, bot_token: &str) -> bool {
        let Some(calculated_hash) = sign_data_check_string(&self.data_check_string(), bot_token)
        else {
            return false;
        };

        calculated_hash
            .as_bytes()
            .ct_eq(self.hash.as_bytes())
            .into()
    }

    /// Reads `id` out of the `user` JSON field. Only meaningful once the data
    /// has been verified.
    pub fn user_id(&self) -> Option<i64> {
        let encoded = self.fields.get("user")?;
        let decoded = url::form_urlencoded::parse(format!("user={}", encoded).as_bytes())
            .next()
            .map(|(_, v)| v.into_owned())?;
        let user: serde_json::Value = serde_json::from_str(&decoded).ok()?;
        user.get("id")?.as_i64()
    }
}

/// Returns `true` only when `raw` carries a `hash` equal to the signature the
/// holder of `bot_token` would have produced for the remaining fields.
/// Malformed input is indistinguishable from a wrong signature.
pub fn verify_init_data(raw: &str, bot_token: &str) -> bool {
    InitData::parse(raw).verify(bot_token)
}

/// Lowercase hex HMAC-SHA256 of `data_check_string`, keyed with
/// HMAC-SHA256("WebAppData", bot_token).
pub fn sign_data_check_string(data_check_string: &str, bot_token: &str) -> Option<String> {
    let mut secret_mac = HmacSha256::new_from_slice(SECRET_KEY_LABEL).ok()?;
    secret_mac.update(bot_token.as_bytes());
    let secret_key = secret_mac.finalize().into_bytes();

    let mut mac = HmacSha256::new_from_slice(&secret_key).ok()?;
    mac.update(data_check_string.as_bytes());
    Some(hex::encode(mac.finalize().into_bytes()))
}

/// Builds a signed init data blob the way the Telegram client would hand it
/// over. Keys must not contain `=` or `&`, values must not contain `&`.
/// A `hash` pair in the input is ignored.
pub fn sign_init_data<'a, I>(pairs: I, bot_token: &str) -> Option<String>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let data = InitData {
        fields: pairs
            .into_iter()
            .filter(|(key, _)| *key != HASH_KEY)
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect(),
        hash: String::new(),
    };
    let hash = sign_data_check_string(&data.data_check_string(), bot_token)?;

    let mut segments: Vec<String> = data
        .fields
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect();
    segments.push(format!("{}={}", HASH_KEY, hash));
    Some(segments.join("&"))
}
