//! Whole-machine tests driven through the public `Console` API.

use std::cell::RefCell;
use std::rc::Rc;

use lockstep::logging::null_logger;
use lockstep::{Config, Console, EmuError, VideoSink};

const PRG_BANK: usize = 16 * 1024;
const CHR_BANK: usize = 8 * 1024;

/// iNES image: `prg_16k` PRG banks with `program` at $8000 and the NMI
/// handler at $8100, vectors in the last bank.
fn build_image(mapper: u8, prg_16k: usize, flags6: u8, program: &[u8]) -> Vec<u8> {
    let mut rom = Vec::with_capacity(16 + prg_16k * PRG_BANK + CHR_BANK);
    rom.extend_from_slice(b"NES\x1A");
    rom.push(prg_16k as u8);
    rom.push(1);
    rom.push(((mapper & 0x0F) << 4) | flags6);
    rom.push(mapper & 0xF0);
    rom.push(1);
    rom.extend_from_slice(&[0u8; 7]);

    let mut prg = vec![0xEAu8; prg_16k * PRG_BANK];
    // Every 16K bank starts with the program so any bank mapped at $8000 runs it.
    for bank in prg.chunks_mut(PRG_BANK) {
        bank[..program.len()].copy_from_slice(program);
        bank[0x100..0x104].copy_from_slice(&[0xEE, 0x01, 0x02, 0x40]); // INC $0201; RTI
        bank[0x3FFA..0x3FFC].copy_from_slice(&0x8100u16.to_le_bytes());
        bank[0x3FFC..0x3FFE].copy_from_slice(&0x8000u16.to_le_bytes());
        bank[0x3FFE..0x4000].copy_from_slice(&0x8100u16.to_le_bytes());
    }
    rom.extend_from_slice(&prg);
    rom.extend(std::iter::repeat_n(0u8, CHR_BANK));
    rom
}

fn quiet() -> Config {
    Config::default().with_logger(null_logger())
}

/// LDA #$80; STA $2000; LDA #$42; STA $0200; JMP *
const NMI_PROGRAM: &[u8] = &[
    0xA9, 0x80, 0x8D, 0x00, 0x20, 0xA9, 0x42, 0x8D, 0x00, 0x02, 0x4C, 0x0A, 0x80,
];

#[test]
fn nrom_program_runs() {
    let mut console =
        Console::from_ines_bytes(&build_image(0, 1, 0, NMI_PROGRAM), quiet()).expect("load");
    assert_eq!(console.cpu().state().pc, 0x8000);
    for _ in 0..5 {
        console.step().expect("step");
    }
    assert_eq!(console.cpu().state().a, 0x42);
    assert_eq!(console.bus_mut().peek(0x0200), 0x42);
    assert_eq!(console.cpu().state().pc, 0x800A);
}

#[test]
fn frames_have_steady_length_and_raise_nmi() {
    let mut console =
        Console::from_ines_bytes(&build_image(0, 1, 0, NMI_PROGRAM), quiet()).expect("load");
    console.run_frame().expect("first frame");
    for _ in 0..3 {
        let cycles = console.run_frame().expect("frame");
        // 262 * 341 dots at three dots per CPU cycle, give or take an instruction.
        assert!((29_776..=29_786).contains(&cycles), "{cycles}");
    }
    // Let the last NMI handler run.
    for _ in 0..5 {
        console.step().expect("step");
    }
    assert_eq!(console.frame_count(), 4);
    assert_eq!(console.bus_mut().peek(0x0201), 4);
}

#[test]
fn audio_is_interleaved_stereo_at_configured_rate() {
    let mut console =
        Console::from_ines_bytes(&build_image(0, 1, 0, NMI_PROGRAM), quiet()).expect("load");
    console.run_frame().expect("frame");
    console.take_samples();
    let cycles = console.run_frame().expect("frame");
    let samples = console.take_samples();
    assert_eq!(samples.len() % 2, 0);
    let expected = (cycles as f64 * 44_100.0 / 1_789_773.0) as usize * 2;
    assert!(samples.len().abs_diff(expected) <= 2, "{} vs {expected}", samples.len());
}

#[derive(Clone, Default)]
struct LineCounter(Rc<RefCell<Vec<usize>>>);

impl VideoSink for LineCounter {
    fn scanline(&mut self, y: usize, rgb: &[u8]) {
        assert_eq!(rgb.len(), 256 * 3);
        self.0.borrow_mut().push(y);
    }
}

#[test]
fn video_sink_sees_every_visible_line() {
    let mut console =
        Console::from_ines_bytes(&build_image(0, 1, 0, NMI_PROGRAM), quiet()).expect("load");
    let sink = LineCounter::default();
    console.set_video_sink(Box::new(sink.clone()));
    console.run_frame().expect("frame");
    let lines = sink.0.borrow();
    assert_eq!(*lines, (0..240).collect::<Vec<_>>());
    assert_eq!(console.frame_buffer().len(), 256 * 240 * 3);
}

#[test]
fn prg_ram_round_trips_on_every_board() {
    for mapper in [0u8, 1, 2, 3, 4, 5, 7, 9, 10, 11, 66, 69] {
        let mut console =
            Console::from_ines_bytes(&build_image(mapper, 2, 0, NMI_PROGRAM), quiet())
                .unwrap_or_else(|e| panic!("mapper {mapper}: {e}"));
        let bus = console.bus_mut();
        match mapper {
            // MMC5: unlock RAM writes.
            5 => {
                bus.write(0x5102, 0x02);
                bus.write(0x5103, 0x01);
            }
            // FME-7: RAM enabled and selected at $6000.
            69 => {
                bus.write(0x8000, 0x08);
                bus.write(0xA000, 0xC0);
            }
            _ => {}
        }
        bus.write(0x6000, 0xA5);
        bus.write(0x7FFF, 0x5A);
        assert_eq!(bus.read(0x6000), 0xA5, "mapper {mapper}");
        assert_eq!(bus.read(0x7FFF), 0x5A, "mapper {mapper}");
    }
}

#[test]
fn battery_ram_is_exposed_as_save_data() {
    let mut console =
        Console::from_ines_bytes(&build_image(0, 1, 0x02, NMI_PROGRAM), quiet()).expect("load");
    console.bus_mut().write(0x6001, 0x99);
    let save = console.save_data().expect("battery board").to_vec();
    assert_eq!(save.len(), 8 * 1024);
    assert_eq!(save[1], 0x99);

    let mut fresh =
        Console::from_ines_bytes(&build_image(0, 1, 0x02, NMI_PROGRAM), quiet()).expect("load");
    fresh.load_save_data(&save);
    assert_eq!(fresh.bus_mut().peek(0x6001), 0x99);
}

#[test]
fn unknown_mapper_is_rejected() {
    let err = Console::from_ines_bytes(&build_image(200, 1, 0, NMI_PROGRAM), quiet());
    assert!(matches!(err, Err(EmuError::UnsupportedMapper(200))));
}

#[test]
fn truncated_image_is_rejected() {
    let mut rom = build_image(0, 1, 0, NMI_PROGRAM);
    rom.truncate(1000);
    let err = Console::from_ines_bytes(&rom, quiet());
    assert!(matches!(err, Err(EmuError::Truncated { .. })));
}
