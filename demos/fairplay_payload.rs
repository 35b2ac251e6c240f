use rseme::adapter::webkit::{
    concat_init_data_id_and_certificate, default_content_id, split_init_data_id_and_certificate,
};
use rseme::codec::{string_to_utf16le, utf16le_to_string};

fn main() -> anyhow::Result<()> {
    let uri = std::env::args()
        .nth(1)
        .expect("Usage: fairplay_payload <skd://content-id>");

    let init = string_to_utf16le(&uri);
    let content_id = default_content_id(&utf16le_to_string(&init));
    let certificate = b"example-certificate";

    let payload = concat_init_data_id_and_certificate(&init, &content_id, certificate);
    println!("content_id: {}", content_id);
    println!("payload: {}", hex::encode(&payload));

    let (_, id, cert) = split_init_data_id_and_certificate(&payload, init.len())?;
    println!("round_trip: {}", id == content_id && cert == certificate);

    Ok(())
}
