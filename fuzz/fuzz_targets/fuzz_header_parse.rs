#![no_main]
use libfuzzer_sys::fuzz_target;
use ocvault::ContainerHeader;

fuzz_target!(|data: &[u8]| {
    if let Ok(header) = ContainerHeader::from_bytes(data) {
        assert_eq!(&header.to_bytes()[..], &data[..ocvault::HEADER_SIZE]);
    }
});
