#![no_main]

use koala_trace::NavRequest;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let token = String::from_utf8_lossy(data);
    let Ok(NavRequest::Open(location)) = NavRequest::decode(&token) else {
        return;
    };

    // Whatever decoded must survive both encodings.
    assert!(!location.path.is_empty());
    assert_eq!(
        NavRequest::decode(&NavRequest::encode(&location)).ok(),
        Some(NavRequest::Open(location.clone()))
    );
    assert_eq!(
        NavRequest::decode(&NavRequest::link(&location)).ok(),
        Some(NavRequest::Open(location))
    );
});
