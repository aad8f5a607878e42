use anyhow::bail;
use pretty_assertions::assert_eq;
use ulp_asm::image::{text_words, ULP_MAGIC};
use ulp_asm::session::epilogue;
use ulp_asm::{
    EncodeError, Listing, Loader, LoaderError, ProgramSession, RtcMemory, SessionConfig,
    SessionError, SessionStatus, Word,
};

fn session() -> ProgramSession {
    ProgramSession::new(SessionConfig::default()).unwrap()
}

struct Unplugged;

impl Loader for Unplugged {
    fn load_image(&mut self, _image: &[u8]) -> anyhow::Result<()> {
        bail!("device unplugged")
    }
    fn start_execution(&mut self, _start_index: usize) -> anyhow::Result<()> {
        bail!("device unplugged")
    }
    fn read_device_memory(&mut self, _word_count: usize) -> anyhow::Result<Vec<Word>> {
        bail!("device unplugged")
    }
}

#[test]
fn variable_word() {
    let mut s = session();
    assert_eq!(s.append_variable(100).unwrap(), 0);
    assert_eq!(s.slots()[0], Word::from_bytes(0x64, 0x00, 0x00, 0x00));
    assert_eq!(s.next_free(), 1);
    assert_eq!(s.status(), SessionStatus::Draft);

    let err = s.append_variable(65536).unwrap_err();
    assert!(matches!(err, SessionError::Encode(EncodeError::InvalidOperand { .. })));
    assert_eq!(s.next_free(), 1);

    s.append_variable(0xffff).unwrap();
    assert_eq!(s.slots()[1], Word::from_bytes(0xff, 0xff, 0x00, 0x00));
}

#[test]
fn failed_encode_leaves_state_alone() {
    let mut s = session();
    assert!(s.append_instruction("jumpr 8, 1, eq").is_err());
    assert!(s.append_instruction("bogus").is_err());
    assert_eq!(s.next_free(), 0);
    assert_eq!(s.status(), SessionStatus::Resident);
}

#[test]
fn capacity_is_fifty_by_default() {
    let mut s = session();
    for i in 0..50 {
        assert_eq!(s.append_instruction("nop").unwrap(), i);
    }
    assert_eq!(s.next_free(), 50);
    let err = s.append_instruction("halt").unwrap_err();
    assert!(matches!(err, SessionError::CapacityExceeded { capacity: 50 }));
    assert!(matches!(s.append_variable(1), Err(SessionError::CapacityExceeded { .. })));
    assert_eq!(s.next_free(), 50);
}

#[test]
fn capacity_follows_config() {
    let mut s = ProgramSession::new(SessionConfig { capacity: 2, load_address: 0 }).unwrap();
    s.append_instruction("wake").unwrap();
    s.append_instruction("halt").unwrap();
    assert!(matches!(s.append_instruction("halt"), Err(SessionError::CapacityExceeded { capacity: 2 })));
    assert!(ProgramSession::new(SessionConfig { capacity: 0, load_address: 0 }).is_err());
}

#[test]
fn run_index_checks() {
    let mut s = session();
    assert!(matches!(s.finalize_for_run(0), Err(SessionError::EmptyProgram)));
    s.append_instruction("wake").unwrap();
    assert!(matches!(s.finalize_for_run(1), Err(SessionError::InvalidRunIndex { max: 0 })));
    assert!(s.is_dirty());

    let req = s.finalize_for_run(0).unwrap();
    assert_eq!(req.start_index, 0);
    assert!(!s.is_dirty());
}

#[test]
fn finalized_image_ends_with_epilogue() {
    let mut s = session();
    s.append_instruction("move r0, 1").unwrap();
    s.append_variable(7).unwrap();
    let req = s.finalize_for_run(1).unwrap();

    let (header, words) = text_words(&req.image).unwrap();
    assert_eq!(header.magic, ULP_MAGIC);
    assert_eq!(header.text_offset, 12);
    assert_eq!(header.text_size, (2 + 2) * 4);
    assert_eq!(header.data_size, 0);
    assert_eq!(header.bss_size, 0);
    let [reg_wr, halt] = epilogue();
    assert_eq!(words, vec![s.slots()[0], s.slots()[1], reg_wr, halt]);
    // the epilogue does not take program slots
    assert_eq!(s.next_free(), 2);
    assert_eq!(s.slots()[2], Word::NOP);
}

#[test]
fn run_loads_and_starts() {
    let mut s = session();
    let mut rtc = RtcMemory::default();
    s.append_instruction("wake").unwrap();
    s.append_instruction("halt").unwrap();
    s.run(1, &mut rtc).unwrap();
    assert_eq!(s.status(), SessionStatus::Resident);
    assert_eq!(rtc.entry, Some(1));
    assert_eq!(&rtc.mem[0..4], &[0x01, 0x00, 0x00, 0x90]);
    assert_eq!(&rtc.mem[8..12], &[0x06, 0x00, 0x60, 0x1c]);
}

#[test]
fn loader_failure_keeps_draft() {
    let mut s = session();
    s.append_instruction("halt").unwrap();

    let err = s.run(0, &mut Unplugged).unwrap_err();
    assert!(matches!(err, SessionError::Loader { stage: "load", .. }));
    assert_eq!(err.to_string(), "load failed: device unplugged");
    assert_eq!(s.status(), SessionStatus::Draft);
    assert_eq!(s.list_snapshot(&mut Unplugged).unwrap(), Listing::Stale);

    // image does not fit: the RTC model reports ESP_ERR_INVALID_SIZE
    let mut tiny = RtcMemory::new(16);
    match s.run(0, &mut tiny).unwrap_err() {
        SessionError::Loader { source, .. } => {
            assert!(matches!(source.downcast_ref::<LoaderError>(), Some(LoaderError::InvalidSize(_))));
        }
        other => panic!("unexpected {other:?}"),
    }
    assert!(s.is_dirty());
}

#[test]
fn reset_clears_everything() {
    let mut s = session();
    for line in ["move r1, 2", "add r0, r1, r1", "halt"] {
        s.append_instruction(line).unwrap();
    }
    s.reset();
    assert_eq!(s.next_free(), 0);
    assert!(s.slots().iter().all(|w| *w == Word::NOP));
    assert_eq!(s.slots().len(), 50);
    assert!(!s.is_dirty());
}

#[test]
fn listing_states() {
    let mut s = session();
    let mut rtc = RtcMemory::default();
    assert_eq!(s.list_snapshot(&mut rtc).unwrap(), Listing::Empty);

    s.append_instruction("wake").unwrap();
    assert_eq!(s.list_snapshot(&mut rtc).unwrap(), Listing::Stale);

    s.run(0, &mut rtc).unwrap();
    assert_eq!(
        s.list_snapshot(&mut rtc).unwrap(),
        Listing::Resident(vec![Word::from_bytes(0x01, 0x00, 0x00, 0x90)])
    );

    s.append_instruction("halt").unwrap();
    assert_eq!(s.list_snapshot(&mut rtc).unwrap(), Listing::Stale);
}
