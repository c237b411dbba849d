//! The firmware's single command loop: classify the first byte of whatever
//! arrived, route it to a mode engine, and reply with ACK/ERR or a payload.
//! Grounded on `firmware/common/serial.c:rx_loop`, reshaped per
//! `SPEC_FULL.md` §9 from one 300-line `switch` into per-command handler
//! methods keyed off `bridge_proto::Command`.
use core::fmt;

use bridge_proto::{
    Command, Frame, ModeCode, ACK, BUTTON_CLEAR_MARKER, ERR, MAX_CHUNK_LEN,
};

use crate::button::ButtonEngine;
use crate::config::{BoardConfig, FirmwareVersion};
use crate::error::{Error, GeneralError};
use crate::error_log::ErrorLog;
use crate::gpio::GpioEngine;
use crate::i2c::{I2cBus, I2cEngine};
use crate::led::{LedDriver, LedService};
use crate::mode::ModeRegistry;
use crate::onewire::{OneWireBus, OneWireEngine};
use crate::pin_registry::PinRegistry;
use crate::platform::{Clock, GpioPin};

/// Largest single read the dispatcher will greedily drain from the
/// transport before it starts interpreting what arrived. Matches the
/// source's `RX_BUFFER_LENGTH_B`.
pub const RX_BUFFER_LEN: usize = 128;

/// Bidirectional byte stream the dispatcher reads frames from and writes
/// replies to. Opening the underlying serial port (`termios`, baud rate,
/// latency) is the transport owner's job, not the dispatcher's -- see
/// `SPEC_FULL.md` §1.
pub trait SerialTransport {
    /// Read one byte, waiting up to the implementation's per-byte timeout.
    /// `None` signals the timeout elapsed with nothing received.
    fn read_byte(&mut self) -> Option<u8>;
    fn write_byte(&mut self, byte: u8);
    fn write_bytes(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.write_byte(b);
        }
    }
}

/// A `core::fmt::Write` sink backed by a fixed-size stack buffer, so status
/// and scan replies can be built with `write!` on a `no_std` target.
struct LineBuf<const N: usize> {
    buf: [u8; N],
    len: usize,
}

impl<const N: usize> LineBuf<N> {
    fn new() -> Self {
        LineBuf { buf: [0; N], len: 0 }
    }

    fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.len]
    }
}

impl<const N: usize> fmt::Write for LineBuf<N> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let bytes = s.as_bytes();
        if self.len + bytes.len() > N {
            return Err(fmt::Error);
        }
        self.buf[self.len..self.len + bytes.len()].copy_from_slice(bytes);
        self.len += bytes.len();
        Ok(())
    }
}

/// Every piece of mutable state the board owns, wired together the way
/// `SPEC_FULL.md` §2's dependency order describes: `PinRegistry` at the
/// bottom, the four bus/button engines next, `Dispatcher` on top.
pub struct Firmware<I2C, OW, GP, BP, BC, LD>
where
    I2C: I2cBus,
    OW: OneWireBus,
    GP: GpioPin,
    BP: GpioPin,
    BC: Clock,
    LD: LedDriver,
{
    modes: ModeRegistry,
    pins: PinRegistry,
    i2c: I2cEngine<I2C>,
    onewire: OneWireEngine<OW>,
    gpio: GpioEngine<GP>,
    button: ButtonEngine<BP, BC>,
    led: LedService<LD>,
    errors: ErrorLog,
    config: BoardConfig,
    fw_version: FirmwareVersion,
    /// Read once at boot from board-specific storage (e.g. a silicon
    /// unique-ID register); not part of `BoardConfig` since it varies per
    /// unit, not per board model.
    chip_id: u64,
}

impl<I2C, OW, GP, BP, BC, LD> Firmware<I2C, OW, GP, BP, BC, LD>
where
    I2C: I2cBus,
    OW: OneWireBus,
    GP: GpioPin,
    BP: GpioPin,
    BC: Clock,
    LD: LedDriver,
{
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: BoardConfig,
        fw_version: FirmwareVersion,
        chip_id: u64,
        supported_modes: &[ModeCode],
        i2c_bus: I2C,
        onewire_bus: OW,
        gpio: GP,
        button_gpio: BP,
        button_clock: BC,
        led_driver: LD,
    ) -> Self {
        let mut led = LedService::new(led_driver, config.heartbeat_available);
        let modes = ModeRegistry::new(supported_modes);
        led.on_mode_changed(modes.current());
        Firmware {
            i2c: I2cEngine::new(i2c_bus, &config),
            onewire: OneWireEngine::new(onewire_bus, config.default_onewire_pin),
            gpio: GpioEngine::new(gpio),
            button: ButtonEngine::new(button_gpio, button_clock),
            led,
            modes,
            pins: PinRegistry::new(),
            errors: ErrorLog::new(),
            config,
            fw_version,
            chip_id,
        }
    }

    /// Run one pass of the cooperative loop: drain whatever is waiting on
    /// `transport`, dispatch the one frame it represents, then perform
    /// heartbeat/button housekeeping. `now_us` is the caller's free-running
    /// microsecond clock, sampled once per pass.
    pub fn run_once<T: SerialTransport>(&mut self, transport: &mut T, now_us: u64) {
        let mut buf = [0u8; RX_BUFFER_LEN];
        let mut len = 0usize;
        while len < RX_BUFFER_LEN {
            match transport.read_byte() {
                Some(b) => {
                    buf[len] = b;
                    len += 1;
                }
                None => break,
            }
        }
        if len > 0 {
            self.dispatch_frame(&buf[..len], transport);
        }

        self.led.tick(now_us);
        if self.button.count() > 0 {
            self.button.tick();
        }
    }

    pub fn last_error(&self) -> u8 {
        self.errors.last_byte()
    }

    fn ack<T: SerialTransport>(&mut self, transport: &mut T) {
        transport.write_byte(ACK);
    }

    fn fail<T: SerialTransport>(&mut self, err: Error, transport: &mut T) {
        self.errors.record(err);
        transport.write_byte(ERR);
    }

    fn reply_result<T: SerialTransport>(&mut self, result: Result<(), Error>, transport: &mut T) {
        match result {
            Ok(()) => self.ack(transport),
            Err(e) => self.fail(e, transport),
        }
    }

    fn dispatch_frame<T: SerialTransport>(&mut self, frame: &[u8], transport: &mut T) {
        match Frame::classify(frame[0]) {
            Some(Frame::Write { len }) => self.handle_write(len, &frame[1..], transport),
            Some(Frame::Read { len }) => self.handle_read(len, transport),
            Some(Frame::Command(byte)) => match Command::from_byte(byte) {
                Some(cmd) => self.handle_command(cmd, &frame[1..], transport),
                None => self.fail(Error::General(GeneralError::UnknownCommand), transport),
            },
            None => self.fail(Error::General(GeneralError::UnknownCommand), transport),
        }
    }

    fn handle_write<T: SerialTransport>(&mut self, len: usize, payload: &[u8], transport: &mut T) {
        let payload = &payload[..len.min(payload.len())];
        match self.modes.current() {
            ModeCode::I2c => {
                let result = self.i2c.write(payload);
                self.reply_result(result, transport);
            }
            ModeCode::OneWire => {
                if self.onewire.state.is_ready {
                    for &b in payload {
                        self.onewire.write_byte(b);
                    }
                    self.ack(transport);
                } else {
                    self.fail(Error::OneWire(crate::error::OneWireError::NotReady), transport);
                }
            }
            _ => self.fail(Error::General(GeneralError::UnknownMode), transport),
        }
    }

    fn handle_read<T: SerialTransport>(&mut self, len: usize, transport: &mut T) {
        debug_assert!(len <= MAX_CHUNK_LEN);
        match self.modes.current() {
            ModeCode::I2c => {
                let mut buf = [0u8; MAX_CHUNK_LEN];
                match self.i2c.read(&mut buf[..len]) {
                    Ok(()) => transport.write_bytes(&buf[..len]),
                    Err(e) => self.fail(e, transport),
                }
            }
            ModeCode::OneWire => {
                if self.onewire.state.is_ready {
                    let mut buf = [0u8; MAX_CHUNK_LEN];
                    for slot in buf.iter_mut().take(len) {
                        *slot = self.onewire.read_byte();
                    }
                    transport.write_bytes(&buf[..len]);
                } else {
                    self.fail(Error::OneWire(crate::error::OneWireError::NotReady), transport);
                }
            }
            _ => self.fail(Error::General(GeneralError::UnknownMode), transport),
        }
    }

    fn handle_command<T: SerialTransport>(&mut self, cmd: Command, payload: &[u8], transport: &mut T) {
        match cmd {
            Command::Handshake => {
                transport.write_bytes(b"OK");
                transport.write_byte(self.fw_version.major);
                transport.write_byte(self.fw_version.minor);
            }
            Command::SetMode => self.cmd_set_mode(payload, transport),
            Command::GetStatus => self.cmd_get_status(transport),
            Command::GetLastError => {
                transport.write_byte(self.errors.last_byte());
                transport.write_bytes(b"\r\n");
            }
            Command::SetHeartbeat => self.cmd_set_heartbeat(payload, transport),
            Command::ConfigureBus => self.cmd_configure_bus(payload, transport),
            Command::InitBus => self.cmd_init_bus(transport),
            Command::DeinitBus => self.cmd_deinit_bus(transport),
            Command::ResetBus => self.cmd_reset_bus(transport),
            Command::ScanBus => self.cmd_scan_bus(transport),
            Command::I2cFreq100 => self.cmd_i2c_freq(100, transport),
            Command::I2cFreq400 => self.cmd_i2c_freq(400, transport),
            Command::I2cStart => self.cmd_i2c_start(payload, transport),
            Command::I2cStop => self.cmd_i2c_stop(transport),
            Command::Gpio => self.cmd_gpio(payload, transport),
            Command::Button => self.cmd_button(payload, transport),
        }
    }

    fn cmd_set_mode<T: SerialTransport>(&mut self, payload: &[u8], transport: &mut T) {
        let Some(&code) = payload.first() else {
            return self.fail(Error::General(GeneralError::UnknownMode), transport);
        };
        match ModeCode::from_byte(code).filter(|m| self.modes.is_supported(*m)) {
            Some(mode) => {
                self.modes.set(mode).ok();
                self.led.on_mode_changed(mode);
                self.ack(transport);
            }
            None => self.fail(Error::General(GeneralError::UnknownMode), transport),
        }
    }

    fn cmd_get_status<T: SerialTransport>(&mut self, transport: &mut T) {
        let mut id_buf = LineBuf::<16>::new();
        let _ = fmt::Write::write_fmt(&mut id_buf, format_args!("{:016X}", self.chip_id));
        let chip_id_hex = core::str::from_utf8(id_buf.as_bytes()).unwrap_or("");

        let mut line = LineBuf::<96>::new();
        let wrote = match self.modes.current() {
            ModeCode::I2c => self.i2c.write_status(self.fw_version, chip_id_hex, self.config.model, &mut line),
            ModeCode::OneWire => {
                self.onewire.write_status(self.fw_version, chip_id_hex, self.config.model, &mut line)
            }
            _ => {
                self.fail(Error::General(GeneralError::UnknownMode), transport);
                return;
            }
        };
        if wrote.is_ok() {
            transport.write_bytes(line.as_bytes());
        } else {
            self.fail(Error::General(GeneralError::CantGetBusInfo), transport);
        }
    }

    fn cmd_set_heartbeat<T: SerialTransport>(&mut self, payload: &[u8], transport: &mut T) {
        let enabled = payload.first() == Some(&1);
        let result = self.led.set_heartbeat(enabled);
        self.reply_result(result, transport);
    }

    fn cmd_configure_bus<T: SerialTransport>(&mut self, payload: &[u8], transport: &mut T) {
        let result = match self.modes.current() {
            ModeCode::I2c => match payload {
                [bus_id, sda, scl, ..] => self.i2c.configure(&self.pins, &self.config, *bus_id, *sda, *scl),
                _ => Err(Error::I2c(crate::error::I2cError::CouldNotConfigure)),
            },
            ModeCode::OneWire => match payload.first() {
                Some(&pin) => self.onewire.configure(&self.pins, pin),
                None => Err(Error::OneWire(crate::error::OneWireError::CouldNotConfigure)),
            },
            _ => Err(Error::General(GeneralError::UnknownMode)),
        };
        self.reply_result(result, transport);
    }

    fn cmd_init_bus<T: SerialTransport>(&mut self, transport: &mut T) {
        let result = match self.modes.current() {
            ModeCode::I2c => self.i2c.init(&mut self.pins),
            ModeCode::OneWire => self.onewire.init(&mut self.pins),
            _ => Err(Error::General(GeneralError::UnknownMode)),
        };
        self.reply_result(result, transport);
    }

    fn cmd_deinit_bus<T: SerialTransport>(&mut self, transport: &mut T) {
        match self.modes.current() {
            ModeCode::I2c => {
                self.i2c.deinit(&mut self.pins);
                self.ack(transport);
            }
            _ => self.fail(Error::General(GeneralError::UnknownMode), transport),
        }
    }

    fn cmd_reset_bus<T: SerialTransport>(&mut self, transport: &mut T) {
        match self.modes.current() {
            ModeCode::I2c => {
                self.i2c.reset();
                self.ack(transport);
            }
            ModeCode::OneWire => {
                self.onewire.reset();
                self.ack(transport);
            }
            _ => self.fail(Error::General(GeneralError::UnknownMode), transport),
        }
    }

    fn cmd_scan_bus<T: SerialTransport>(&mut self, transport: &mut T) {
        match self.modes.current() {
            ModeCode::I2c => {
                if !self.i2c.state.is_ready {
                    let _ = self.i2c.init(&mut self.pins);
                }
                let scan = self.i2c.scan();
                let mut line = LineBuf::<400>::new();
                if scan.write_reply(&mut line).is_ok() {
                    transport.write_bytes(line.as_bytes());
                } else {
                    self.fail(Error::General(GeneralError::CantGetBusInfo), transport);
                }
            }
            ModeCode::OneWire => {
                if !self.onewire.state.is_ready {
                    let _ = self.onewire.init(&mut self.pins);
                }
                let scan = self.onewire.scan();
                let mut line = LineBuf::<1040>::new();
                if scan.write_reply(&mut line).is_ok() {
                    transport.write_bytes(line.as_bytes());
                } else {
                    self.fail(Error::General(GeneralError::CantGetBusInfo), transport);
                }
            }
            _ => self.fail(Error::General(GeneralError::UnknownMode), transport),
        }
    }

    fn cmd_i2c_freq<T: SerialTransport>(&mut self, khz: u16, transport: &mut T) {
        if self.modes.current() != ModeCode::I2c {
            return self.fail(Error::General(GeneralError::UnknownMode), transport);
        }
        self.i2c.set_frequency(khz);
        self.ack(transport);
    }

    fn cmd_i2c_start<T: SerialTransport>(&mut self, payload: &[u8], transport: &mut T) {
        if self.modes.current() != ModeCode::I2c {
            return self.fail(Error::General(GeneralError::UnknownMode), transport);
        }
        let Some(&addr_op) = payload.first() else {
            return self.fail(Error::I2c(crate::error::I2cError::NotReady), transport);
        };
        let result = self.i2c.start(addr_op);
        self.reply_result(result, transport);
    }

    fn cmd_i2c_stop<T: SerialTransport>(&mut self, transport: &mut T) {
        if self.modes.current() != ModeCode::I2c {
            return self.fail(Error::General(GeneralError::UnknownMode), transport);
        }
        let result = self.i2c.stop();
        self.reply_result(result, transport);
    }

    fn cmd_gpio<T: SerialTransport>(&mut self, payload: &[u8], transport: &mut T) {
        let Some(&command_byte) = payload.first() else {
            return self.fail(Error::General(GeneralError::UnknownCommand), transport);
        };
        let pin = command_byte & 0x1F;

        if payload.get(1).copied().map(GpioEngine::<GP>::is_clear_marker) == Some(true) {
            self.gpio.clear(&mut self.pins, pin);
            return self.ack(transport);
        }

        match self.gpio.set(&mut self.pins, command_byte) {
            Ok(reply) => transport.write_byte(reply.unwrap_or(0xFF)),
            Err(e) => self.fail(e, transport),
        }
    }

    fn cmd_button<T: SerialTransport>(&mut self, payload: &[u8], transport: &mut T) {
        let Some(&command_byte) = payload.first() else {
            return self.fail(Error::General(GeneralError::UnknownCommand), transport);
        };
        let is_read = (command_byte & 0x20) != 0;
        if is_read {
            let bytes = self.button.take_state_le_bytes();
            return transport.write_bytes(&bytes);
        }

        let pin = command_byte & 0x1F;
        if payload.get(1) == Some(&BUTTON_CLEAR_MARKER) {
            let result = self.button.clear(&mut self.pins, pin);
            return self.reply_result(result, transport);
        }

        let result = self.button.set(&mut self.pins, command_byte);
        self.reply_result(result, transport);
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, VecDeque};

    use bridge_proto::ModeCode;

    use super::*;
    use crate::config::PICO_BOARD_CONFIG;
    use crate::i2c::HostedI2cBus;
    use crate::onewire::HostedOneWireBus;

    #[derive(Default)]
    struct FakeGpio {
        level: BTreeMap<u8, bool>,
    }
    impl GpioPin for FakeGpio {
        fn set_direction(&mut self, _pin: u8, _output: bool) {}
        fn write(&mut self, pin: u8, high: bool) {
            self.level.insert(pin, high);
        }
        fn read(&mut self, pin: u8) -> bool {
            *self.level.get(&pin).unwrap_or(&false)
        }
        fn pull_down(&mut self, _pin: u8) {}
        fn pull_up(&mut self, _pin: u8) {}
        fn deinit(&mut self, _pin: u8) {}
    }

    struct FakeClock(u64);
    impl Clock for FakeClock {
        fn now_us(&self) -> u64 {
            self.0
        }
        fn delay_us(&mut self, us: u32) {
            self.0 += us as u64;
        }
    }

    #[derive(Default)]
    struct FakeLed {
        on: bool,
        colour: u32,
    }
    impl LedDriver for FakeLed {
        fn set_state(&mut self, on: bool) {
            self.on = on;
        }
        fn set_colour(&mut self, rgb: u32) {
            self.colour = rgb;
        }
    }

    #[derive(Default)]
    struct FakeTransport {
        inbox: VecDeque<u8>,
        outbox: Vec<u8>,
    }
    impl FakeTransport {
        fn push(&mut self, bytes: &[u8]) {
            self.inbox.extend(bytes.iter().copied());
        }
    }
    impl SerialTransport for FakeTransport {
        fn read_byte(&mut self) -> Option<u8> {
            self.inbox.pop_front()
        }
        fn write_byte(&mut self, byte: u8) {
            self.outbox.push(byte);
        }
    }

    type TestFirmware =
        Firmware<HostedI2cBus, HostedOneWireBus, FakeGpio, FakeGpio, FakeClock, FakeLed>;

    fn firmware() -> TestFirmware {
        Firmware::new(
            PICO_BOARD_CONFIG,
            FirmwareVersion { major: 1, minor: 2, patch: 0, build: 1 },
            0x1122_3344_5566_7788,
            &[ModeCode::I2c, ModeCode::OneWire],
            HostedI2cBus::new(),
            HostedOneWireBus::new(),
            FakeGpio::default(),
            FakeGpio::default(),
            FakeClock(0),
            FakeLed::default(),
        )
    }

    /// S1 -- handshake then mode-set.
    #[test]
    fn handshake_then_set_mode() {
        let mut fw = firmware();
        let mut t = FakeTransport::default();
        t.push(&[b'!']);
        fw.run_once(&mut t, 0);
        assert_eq!(t.outbox, vec![b'O', b'K', 0x01, 0x02]);

        t.outbox.clear();
        t.push(&[b'#', b'i']);
        fw.run_once(&mut t, 0);
        assert_eq!(t.outbox, vec![ACK]);
    }

    /// S2 -- scanning an empty I2C bus replies "Z\r\n".
    #[test]
    fn i2c_scan_empty_bus_replies_z() {
        let mut fw = firmware();
        let mut t = FakeTransport::default();
        t.push(&[b'#', b'i']);
        fw.run_once(&mut t, 0);
        t.outbox.clear();

        t.push(&[b'i']);
        fw.run_once(&mut t, 0);
        assert_eq!(t.outbox, vec![ACK]);
        t.outbox.clear();

        t.push(&[b'd']);
        fw.run_once(&mut t, 0);
        assert_eq!(t.outbox, b"Z\r\n".to_vec());
    }

    /// S3 -- start, chunked write, restart, chunked read, stop.
    #[test]
    fn i2c_write_then_read_round_trip() {
        let mut fw = firmware();
        let mut t = FakeTransport::default();
        t.push(&[b'#', b'i']);
        fw.run_once(&mut t, 0);
        t.outbox.clear();

        fw.i2c.bus_mut().add_device(0x70);
        t.push(&[b'i']);
        fw.run_once(&mut t, 0);
        assert_eq!(t.outbox, vec![ACK]);
        t.outbox.clear();

        // start, write address
        t.push(&[b's', 0xE0]);
        fw.run_once(&mut t, 0);
        assert_eq!(t.outbox, vec![ACK]);
        t.outbox.clear();

        // write-prefix for 2 bytes
        t.push(&[0xC1, 0x21, 0x81]);
        fw.run_once(&mut t, 0);
        assert_eq!(t.outbox, vec![ACK]);
        t.outbox.clear();

        // restart for read
        t.push(&[b's', 0xE1]);
        fw.run_once(&mut t, 0);
        assert_eq!(t.outbox, vec![ACK]);
        t.outbox.clear();

        // read-prefix for 1 byte
        t.push(&[0x80]);
        fw.run_once(&mut t, 0);
        assert_eq!(t.outbox, vec![0x21]);
        t.outbox.clear();

        t.push(&[b'p']);
        fw.run_once(&mut t, 0);
        assert_eq!(t.outbox, vec![ACK]);
    }

    /// S4 -- GPIO set then read round-trip.
    #[test]
    fn gpio_write_then_read() {
        let mut fw = firmware();
        let mut t = FakeTransport::default();

        // pin 5, dir=out, state=1
        t.push(&[b'g', 0b1100_0101]);
        fw.run_once(&mut t, 0);
        assert_eq!(t.outbox, vec![0xFF]);
        t.outbox.clear();

        // pin 5, dir=in, read
        t.push(&[b'g', 0b0010_0101]);
        fw.run_once(&mut t, 0);
        assert_eq!(t.outbox, vec![0b1000_0101]);
    }

    /// S5 -- configure a button, debounce a press, read the latch.
    #[test]
    fn button_debounce_then_read() {
        let mut fw = firmware();
        let mut t = FakeTransport::default();

        // pin 1, active-high, trigger on press
        t.push(&[b'b', 0x01]);
        fw.run_once(&mut t, 0);
        assert_eq!(t.outbox, vec![ACK]);
        t.outbox.clear();

        fw.button.gpio_mut().level.insert(1, true);
        fw.run_once(&mut t, 0); // arms press_time
        fw.run_once(&mut t, 6_000); // debounce window elapses -> latches

        t.push(&[b'b', 0x21]);
        fw.run_once(&mut t, 6_000);
        assert_eq!(u32::from_le_bytes(t.outbox.clone().try_into().unwrap()) & 1, 1);
    }

    /// S6 -- 1-Wire search over two devices, then scan reply decodes both.
    #[test]
    fn onewire_search_then_scan() {
        let mut fw = firmware();
        let mut t = FakeTransport::default();
        t.push(&[b'#', b'o']);
        fw.run_once(&mut t, 0);
        t.outbox.clear();

        let a: u64 = 0x2800_0001_2345_6789;
        let b: u64 = a ^ 1;
        fw.onewire.bus_mut().add_device(a);
        fw.onewire.bus_mut().add_device(b);

        t.push(&[b'i']);
        fw.run_once(&mut t, 0);
        assert_eq!(t.outbox, vec![ACK]);
        t.outbox.clear();

        t.push(&[b'd']);
        fw.run_once(&mut t, 0);
        assert_eq!(t.outbox.len(), 32 + 2);
        assert_eq!(&t.outbox[t.outbox.len() - 2..], b"\r\n");
    }

    #[test]
    fn unknown_command_byte_yields_err_and_records_error() {
        let mut fw = firmware();
        let mut t = FakeTransport::default();
        t.push(&[b'~']);
        fw.run_once(&mut t, 0);
        assert_eq!(t.outbox, vec![ERR]);
        assert_eq!(fw.last_error(), bridge_proto::ErrorCode::GenUnknownCommand.as_wire_byte());
    }

    #[test]
    fn i2c_commands_gated_out_in_onewire_mode() {
        let mut fw = firmware();
        let mut t = FakeTransport::default();
        t.push(&[b'#', b'o']);
        fw.run_once(&mut t, 0);
        t.outbox.clear();

        for cmd in [b'1', b'4', b's', b'p', b'k'] {
            t.push(&[cmd, 0]);
            fw.run_once(&mut t, 0);
            assert_eq!(t.outbox, vec![ERR], "command {:?} should be gated out", cmd as char);
            t.outbox.clear();
        }
    }
}
