//! The bit-addressable instruction subset: single-bit test-and-branch,
//! boolean accumulator (carry) logic, and direct bit set/clear/complement.

use super::Mcs51;

impl Mcs51 {
    pub(super) fn op_jbc(&mut self) {
        let bit_addr = self.fetch_u8();
        let rel = self.fetch_u8();
        if self.mem.read_bit(bit_addr) {
            self.mem.write_bit(bit_addr, false);
            self.jump_relative(rel);
        }
    }

    pub(super) fn op_jb(&mut self) {
        let bit_addr = self.fetch_u8();
        let rel = self.fetch_u8();
        if self.mem.read_bit(bit_addr) {
            self.jump_relative(rel);
        }
    }

    pub(super) fn op_jnb(&mut self) {
        let bit_addr = self.fetch_u8();
        let rel = self.fetch_u8();
        if !self.mem.read_bit(bit_addr) {
            self.jump_relative(rel);
        }
    }

    pub(super) fn op_orl_c_bit(&mut self) {
        let bit_addr = self.fetch_u8();
        let bit = self.mem.read_bit(bit_addr);
        let c = self.mem.psw_c();
        self.mem.set_psw_c(c || bit);
    }

    pub(super) fn op_orl_c_notbit(&mut self) {
        let bit_addr = self.fetch_u8();
        let bit = self.mem.read_bit(bit_addr);
        let c = self.mem.psw_c();
        self.mem.set_psw_c(c || !bit);
    }

    pub(super) fn op_anl_c_bit(&mut self) {
        let bit_addr = self.fetch_u8();
        let bit = self.mem.read_bit(bit_addr);
        let c = self.mem.psw_c();
        self.mem.set_psw_c(c && bit);
    }

    pub(super) fn op_anl_c_notbit(&mut self) {
        let bit_addr = self.fetch_u8();
        let bit = self.mem.read_bit(bit_addr);
        let c = self.mem.psw_c();
        self.mem.set_psw_c(c && !bit);
    }

    pub(super) fn op_mov_bit_c(&mut self) {
        let bit_addr = self.fetch_u8();
        let c = self.mem.psw_c();
        self.mem.write_bit(bit_addr, c);
    }

    pub(super) fn op_mov_c_bit(&mut self) {
        let bit_addr = self.fetch_u8();
        let bit = self.mem.read_bit(bit_addr);
        self.mem.set_psw_c(bit);
    }

    pub(super) fn op_cpl_bit(&mut self) {
        let bit_addr = self.fetch_u8();
        let bit = self.mem.read_bit(bit_addr);
        self.mem.write_bit(bit_addr, !bit);
    }

    pub(super) fn op_clr_bit(&mut self) {
        let bit_addr = self.fetch_u8();
        self.mem.write_bit(bit_addr, false);
    }

    pub(super) fn op_setb_bit(&mut self) {
        let bit_addr = self.fetch_u8();
        self.mem.write_bit(bit_addr, true);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cpu_with(rom: &[u8]) -> Mcs51 {
        let mut cpu = Mcs51::new();
        cpu.memory_mut().rom_mut()[..rom.len()].copy_from_slice(rom);
        cpu
    }

    #[test]
    fn jbc_clears_bit_and_branches_only_when_set() {
        let mut cpu = cpu_with(&[0x10, 0x00, 0x02]); // JBC 0x00,+2
        cpu.memory_mut().write_bit(0x00, true);
        cpu.step();
        assert!(!cpu.memory().read_bit(0x00));
        assert_eq!(cpu.pc(), 3 + 2);
    }

    #[test]
    fn jnb_branches_when_bit_clear() {
        let mut cpu = cpu_with(&[0x30, 0x00, 0x02]); // JNB 0x00,+2
        cpu.step();
        assert_eq!(cpu.pc(), 3 + 2);
    }

    #[test]
    fn setb_and_clr_bit_round_trip() {
        let mut cpu = cpu_with(&[0xD2, 0x00, 0xC2, 0x00]); // SETB 0x00; CLR 0x00
        cpu.step();
        assert!(cpu.memory().read_bit(0x00));
        cpu.step();
        assert!(!cpu.memory().read_bit(0x00));
    }

    #[test]
    fn mov_c_bit_and_back() {
        let mut cpu = cpu_with(&[0xD2, 0x00, 0xA2, 0x00, 0x92, 0x01]);
        cpu.step(); // SETB 0x00
        cpu.step(); // MOV C,0x00
        assert!(cpu.memory().psw_c());
        cpu.step(); // MOV 0x01,C
        assert!(cpu.memory().read_bit(0x01));
    }
}
