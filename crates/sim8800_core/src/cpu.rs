use crate::engine::{Bus8080, CpuStatus, Engine, StatusFlags};

/// CPU flags for Intel 8080.
#[derive(Default, Clone, Copy, Debug, PartialEq, Eq)]
pub struct Flags {
    pub z: bool,  // zero
    pub s: bool,  // sign
    pub p: bool,  // parity
    pub cy: bool, // carry
    pub ac: bool, // auxiliary carry
}

impl Flags {
    pub fn to_u8(self) -> u8 {
        // Bit 1 is always set.
        let mut f = StatusFlags::ALWAYS_ONE;
        f.set(StatusFlags::SIGN, self.s);
        f.set(StatusFlags::ZERO, self.z);
        f.set(StatusFlags::AUX_CARRY, self.ac);
        f.set(StatusFlags::PARITY, self.p);
        f.set(StatusFlags::CARRY, self.cy);
        f.bits()
    }

    pub fn from_u8(v: u8) -> Self {
        let f = StatusFlags::from_bits_truncate(v);
        Self {
            z: f.contains(StatusFlags::ZERO),
            s: f.contains(StatusFlags::SIGN),
            p: f.contains(StatusFlags::PARITY),
            cy: f.contains(StatusFlags::CARRY),
            ac: f.contains(StatusFlags::AUX_CARRY),
        }
    }
}

/// Intel 8080 CPU core.
///
/// Instructions are decoded from the standard octal fields of the opcode
/// (`xx yyy zzz`), which covers the whole 256 entry map including the
/// undocumented aliases (extra NOPs, `CB` = JMP, `D9` = RET, `DD/ED/FD` =
/// CALL).
#[derive(Default, Debug)]
pub struct Cpu8080 {
    pub a: u8,
    pub b: u8,
    pub c: u8,
    pub d: u8,
    pub e: u8,
    pub h: u8,
    pub l: u8,
    pub sp: u16,
    pub pc: u16,
    pub flags: Flags,
    pub interrupts_enabled: bool,
    /// Set by HLT. Only a reset gets the CPU going again since the panel
    /// never raises interrupts.
    pub halted: bool,
}

impl Cpu8080 {
    /// Create a new CPU instance in reset state.
    pub fn new() -> Self {
        Self::default()
    }

    fn fetch_byte<B: Bus8080>(&mut self, bus: &mut B) -> u8 {
        let b = bus.mem_read(self.pc);
        self.pc = self.pc.wrapping_add(1);
        b
    }

    fn fetch_word<B: Bus8080>(&mut self, bus: &mut B) -> u16 {
        let lo = self.fetch_byte(bus);
        let hi = self.fetch_byte(bus);
        u16::from_le_bytes([lo, hi])
    }

    fn hl(&self) -> u16 {
        u16::from_be_bytes([self.h, self.l])
    }

    fn set_hl(&mut self, value: u16) {
        [self.h, self.l] = value.to_be_bytes();
    }

    /// Register pair by its `pp` field: BC, DE, HL, SP.
    fn pair(&self, index: u8) -> u16 {
        match index & 0x03 {
            0 => u16::from_be_bytes([self.b, self.c]),
            1 => u16::from_be_bytes([self.d, self.e]),
            2 => self.hl(),
            _ => self.sp,
        }
    }

    fn set_pair(&mut self, index: u8, value: u16) {
        match index & 0x03 {
            0 => [self.b, self.c] = value.to_be_bytes(),
            1 => [self.d, self.e] = value.to_be_bytes(),
            2 => self.set_hl(value),
            _ => self.sp = value,
        }
    }

    /// Register by its `rrr` field; index 6 is the memory operand M at (HL).
    fn reg<B: Bus8080>(&mut self, bus: &mut B, index: u8) -> u8 {
        match index & 0x07 {
            0 => self.b,
            1 => self.c,
            2 => self.d,
            3 => self.e,
            4 => self.h,
            5 => self.l,
            6 => bus.mem_read(self.hl()),
            _ => self.a,
        }
    }

    fn set_reg<B: Bus8080>(&mut self, bus: &mut B, index: u8, value: u8) {
        match index & 0x07 {
            0 => self.b = value,
            1 => self.c = value,
            2 => self.d = value,
            3 => self.e = value,
            4 => self.h = value,
            5 => self.l = value,
            6 => bus.mem_write(self.hl(), value),
            _ => self.a = value,
        }
    }

    /// Condition by its `ccc` field: NZ, Z, NC, C, PO, PE, P, M.
    fn condition(&self, index: u8) -> bool {
        match index & 0x07 {
            0 => !self.flags.z,
            1 => self.flags.z,
            2 => !self.flags.cy,
            3 => self.flags.cy,
            4 => !self.flags.p,
            5 => self.flags.p,
            6 => !self.flags.s,
            _ => self.flags.s,
        }
    }

    fn set_szp(&mut self, value: u8) {
        self.flags.z = value == 0;
        self.flags.s = (value & 0x80) != 0;
        self.flags.p = value.count_ones() % 2 == 0;
    }

    /// Accumulator operation by its `ooo` field: ADD ADC SUB SBB ANA XRA ORA CMP.
    fn alu(&mut self, op: u8, value: u8) {
        let a = self.a;
        let carry = u8::from(self.flags.cy);
        let res = match op & 0x07 {
            0 | 1 => {
                let carry = if op & 0x07 == 1 { carry } else { 0 };
                self.flags.ac = (a & 0x0f) + (value & 0x0f) + carry > 0x0f;
                self.flags.cy = u16::from(a) + u16::from(value) + u16::from(carry) > 0xff;
                a.wrapping_add(value).wrapping_add(carry)
            }
            2 | 3 | 7 => {
                let carry = if op & 0x07 == 3 { carry } else { 0 };
                // The ALU adds the complement; AC is the carry out of bit 3.
                self.flags.ac = (a & 0x0f) + (!value & 0x0f) + (1 - carry) > 0x0f;
                self.flags.cy = u16::from(a) < u16::from(value) + u16::from(carry);
                a.wrapping_sub(value).wrapping_sub(carry)
            }
            4 => {
                self.flags.cy = false;
                self.flags.ac = ((a | value) & 0x08) != 0;
                a & value
            }
            5 => {
                self.flags.cy = false;
                self.flags.ac = false;
                a ^ value
            }
            _ => {
                self.flags.cy = false;
                self.flags.ac = false;
                a | value
            }
        };
        self.set_szp(res);
        // CMP only sets flags.
        if op & 0x07 != 7 {
            self.a = res;
        }
    }

    fn inr(&mut self, value: u8) -> u8 {
        let r = value.wrapping_add(1);
        self.flags.ac = (value & 0x0f) + 1 > 0x0f;
        // Carry flag is not affected by INR.
        self.set_szp(r);
        r
    }

    fn dcr(&mut self, value: u8) -> u8 {
        let r = value.wrapping_sub(1);
        self.flags.ac = (r & 0x0f) != 0x0f;
        // Carry flag is not affected by DCR.
        self.set_szp(r);
        r
    }

    fn dad(&mut self, value: u16) {
        let (res, carry) = self.hl().overflowing_add(value);
        self.flags.cy = carry;
        self.set_hl(res);
    }

    fn daa(&mut self) {
        let mut adjust: u8 = 0;
        let mut carry = self.flags.cy;
        let low = self.a & 0x0f;
        let high = self.a >> 4;

        if low > 9 || self.flags.ac {
            adjust |= 0x06;
        }
        if high > 9 || self.flags.cy || (high >= 9 && low > 9) {
            adjust |= 0x60;
            carry = true;
        }

        if adjust != 0 {
            self.alu(0, adjust);
            self.flags.cy = carry;
        }
    }

    fn push<B: Bus8080>(&mut self, bus: &mut B, value: u16) {
        self.sp = self.sp.wrapping_sub(2);
        let [lo, hi] = value.to_le_bytes();
        bus.mem_write(self.sp, lo);
        bus.mem_write(self.sp.wrapping_add(1), hi);
    }

    fn pop<B: Bus8080>(&mut self, bus: &mut B) -> u16 {
        let lo = bus.mem_read(self.sp);
        let hi = bus.mem_read(self.sp.wrapping_add(1));
        self.sp = self.sp.wrapping_add(2);
        u16::from_le_bytes([lo, hi])
    }

    /// Execute a single instruction and return the number of cycles consumed.
    pub fn execute<B: Bus8080>(&mut self, bus: &mut B) -> u32 {
        if self.halted {
            return 4;
        }
        let opcode = self.fetch_byte(bus);
        let y = (opcode >> 3) & 0x07;
        let z = opcode & 0x07;
        match opcode >> 6 {
            0 => self.execute_misc(bus, y, z),
            1 if opcode == 0x76 => {
                // HLT
                self.halted = true;
                7
            }
            1 => {
                // MOV r1,r2
                let value = self.reg(bus, z);
                self.set_reg(bus, y, value);
                if y == 6 || z == 6 {
                    7
                } else {
                    5
                }
            }
            2 => {
                // ALU r
                let value = self.reg(bus, z);
                self.alu(y, value);
                if z == 6 {
                    7
                } else {
                    4
                }
            }
            _ => self.execute_control(bus, y, z),
        }
    }

    /// Opcodes 00–3F: loads, increments, 16-bit arithmetic and rotates.
    fn execute_misc<B: Bus8080>(&mut self, bus: &mut B, y: u8, z: u8) -> u32 {
        let p = y >> 1;
        let q = y & 1 != 0;
        match z {
            // NOP, plus the undocumented 08/10/18/20/28/30/38.
            0 => 4,
            1 if !q => {
                // LXI rp,d16
                let value = self.fetch_word(bus);
                self.set_pair(p, value);
                10
            }
            1 => {
                // DAD rp
                self.dad(self.pair(p));
                10
            }
            2 => self.execute_indirect(bus, p, q),
            3 => {
                // INX rp / DCX rp
                let value = if q {
                    self.pair(p).wrapping_sub(1)
                } else {
                    self.pair(p).wrapping_add(1)
                };
                self.set_pair(p, value);
                5
            }
            4 | 5 => {
                // INR r / DCR r
                let value = self.reg(bus, y);
                let res = if z == 4 { self.inr(value) } else { self.dcr(value) };
                self.set_reg(bus, y, res);
                if y == 6 {
                    10
                } else {
                    5
                }
            }
            6 => {
                // MVI r,d8
                let value = self.fetch_byte(bus);
                self.set_reg(bus, y, value);
                if y == 6 {
                    10
                } else {
                    7
                }
            }
            _ => {
                self.execute_accumulator(y);
                4
            }
        }
    }

    /// STAX/LDAX/SHLD/LHLD/STA/LDA.
    fn execute_indirect<B: Bus8080>(&mut self, bus: &mut B, p: u8, load: bool) -> u32 {
        match (p, load) {
            (0 | 1, false) => {
                bus.mem_write(self.pair(p), self.a);
                7
            }
            (0 | 1, true) => {
                self.a = bus.mem_read(self.pair(p));
                7
            }
            (2, false) => {
                let addr = self.fetch_word(bus);
                bus.mem_write(addr, self.l);
                bus.mem_write(addr.wrapping_add(1), self.h);
                16
            }
            (2, true) => {
                let addr = self.fetch_word(bus);
                self.l = bus.mem_read(addr);
                self.h = bus.mem_read(addr.wrapping_add(1));
                16
            }
            (_, false) => {
                let addr = self.fetch_word(bus);
                bus.mem_write(addr, self.a);
                13
            }
            (_, true) => {
                let addr = self.fetch_word(bus);
                self.a = bus.mem_read(addr);
                13
            }
        }
    }

    /// RLC RRC RAL RAR DAA CMA STC CMC.
    fn execute_accumulator(&mut self, y: u8) {
        match y {
            0 => {
                self.flags.cy = self.a & 0x80 != 0;
                self.a = self.a.rotate_left(1);
            }
            1 => {
                self.flags.cy = self.a & 0x01 != 0;
                self.a = self.a.rotate_right(1);
            }
            2 => {
                let carry = u8::from(self.flags.cy);
                self.flags.cy = self.a & 0x80 != 0;
                self.a = (self.a << 1) | carry;
            }
            3 => {
                let carry = if self.flags.cy { 0x80 } else { 0 };
                self.flags.cy = self.a & 0x01 != 0;
                self.a = (self.a >> 1) | carry;
            }
            4 => self.daa(),
            5 => self.a = !self.a,
            6 => self.flags.cy = true,
            _ => self.flags.cy = !self.flags.cy,
        }
    }

    /// Opcodes C0–FF: branches, stack, IO and immediates.
    fn execute_control<B: Bus8080>(&mut self, bus: &mut B, y: u8, z: u8) -> u32 {
        let p = y >> 1;
        let q = y & 1 != 0;
        match z {
            0 => {
                // Rcc
                if self.condition(y) {
                    self.pc = self.pop(bus);
                    11
                } else {
                    5
                }
            }
            1 => match (p, q) {
                (3, false) => {
                    // POP PSW
                    let [f, a] = self.pop(bus).to_le_bytes();
                    self.a = a;
                    self.flags = Flags::from_u8(f);
                    10
                }
                (_, false) => {
                    let value = self.pop(bus);
                    self.set_pair(p, value);
                    10
                }
                (0 | 1, true) => {
                    // RET (D9 is an alias)
                    self.pc = self.pop(bus);
                    10
                }
                (2, true) => {
                    // PCHL
                    self.pc = self.hl();
                    5
                }
                (_, true) => {
                    // SPHL
                    self.sp = self.hl();
                    5
                }
            },
            2 => {
                // Jcc
                let addr = self.fetch_word(bus);
                if self.condition(y) {
                    self.pc = addr;
                }
                10
            }
            3 => match y {
                0 | 1 => {
                    // JMP (CB is an alias)
                    self.pc = self.fetch_word(bus);
                    10
                }
                2 => {
                    // OUT port
                    let port = self.fetch_byte(bus);
                    bus.io_write(port, self.a);
                    10
                }
                3 => {
                    // IN port
                    let port = self.fetch_byte(bus);
                    self.a = bus.io_read(port);
                    10
                }
                4 => {
                    // XTHL
                    let top = self.pop(bus);
                    let hl = self.hl();
                    self.push(bus, hl);
                    self.set_hl(top);
                    18
                }
                5 => {
                    // XCHG
                    std::mem::swap(&mut self.d, &mut self.h);
                    std::mem::swap(&mut self.e, &mut self.l);
                    4
                }
                6 => {
                    self.interrupts_enabled = false;
                    4
                }
                _ => {
                    self.interrupts_enabled = true;
                    4
                }
            },
            4 => {
                // Ccc
                let addr = self.fetch_word(bus);
                if self.condition(y) {
                    self.push(bus, self.pc);
                    self.pc = addr;
                    17
                } else {
                    11
                }
            }
            5 if !q => {
                // PUSH rp / PUSH PSW
                let value = if p == 3 {
                    u16::from_be_bytes([self.a, self.flags.to_u8()])
                } else {
                    self.pair(p)
                };
                self.push(bus, value);
                11
            }
            5 => {
                // CALL (DD, ED, FD are aliases)
                let addr = self.fetch_word(bus);
                self.push(bus, self.pc);
                self.pc = addr;
                17
            }
            6 => {
                // ADI ACI SUI SBI ANI XRI ORI CPI
                let value = self.fetch_byte(bus);
                self.alu(y, value);
                7
            }
            _ => {
                // RST n
                self.push(bus, self.pc);
                self.pc = u16::from(y) << 3;
                11
            }
        }
    }
}

impl Engine for Cpu8080 {
    fn reset(&mut self) {
        *self = Self::default();
    }

    fn step<B: Bus8080>(&mut self, bus: &mut B, cycles: u32) -> u32 {
        let mut elapsed: u32 = 0;
        loop {
            elapsed = elapsed.saturating_add(self.execute(bus));
            if elapsed >= cycles {
                return elapsed;
            }
        }
    }

    fn status(&self) -> CpuStatus {
        CpuStatus {
            pc: self.pc,
            sp: self.sp,
            a: self.a,
            b: self.b,
            c: self.c,
            d: self.d,
            e: self.e,
            f: self.flags.to_u8(),
            h: self.h,
            l: self.l,
        }
    }
}
