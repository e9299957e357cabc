//! vCPU opcode reference table
//!
//! Only the instructions the translator emits are listed. Branch conditions
//! are a separate table: `BCC` is followed by one of them and then by the
//! in-page target offset.

/// A named byte emitted as an instruction
pub trait Mnemonic: Copy {
    fn byte(self) -> u8;
    fn mnemonic(self) -> &'static str;
}

macro_rules! byte_table {
    ($(#[$meta:meta])* $name:ident, $table:ident { $($variant:ident = $byte:literal, $text:literal;)* }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant,)*
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant,)*];
        }

        impl Mnemonic for $name {
            fn byte(self) -> u8 {
                match self {
                    $($name::$variant => $byte,)*
                }
            }

            fn mnemonic(self) -> &'static str {
                match self {
                    $($name::$variant => $text,)*
                }
            }
        }

        pub const $table: &[(u8, &str)] = &[$(($byte, $text),)*];
    };
}

byte_table! {
    /// vCPU instructions
    Opcode, VCPU_OPCODE_TABLE {
        St = 0x5e, "ST";
        Stw = 0x2b, "STW";
        Stlw = 0xec, "STLW";
        Ld = 0x1a, "LD";
        Ldi = 0x59, "LDI";
        Ldwi = 0x11, "LDWI";
        Ldw = 0x21, "LDW";
        Ldlw = 0xee, "LDLW";
        Addw = 0x99, "ADDW";
        Subw = 0xb8, "SUBW";
        Addi = 0xe3, "ADDI";
        Subi = 0xe6, "SUBI";
        Lslw = 0xe9, "LSLW";
        Inc = 0x93, "INC";
        Andi = 0x82, "ANDI";
        Andw = 0xf8, "ANDW";
        Ori = 0x88, "ORI";
        Orw = 0xfa, "ORW";
        Xori = 0x8c, "XORI";
        Xorw = 0xfc, "XORW";
        Peek = 0xad, "PEEK";
        Deek = 0xf6, "DEEK";
        Poke = 0xf0, "POKE";
        Doke = 0xf3, "DOKE";
        Lup = 0x7f, "LUP";
        Bra = 0x90, "BRA";
        Bcc = 0x35, "BCC";
        Call = 0xcf, "CALL";
        Ret = 0xff, "RET";
        Push = 0x75, "PUSH";
        Pop = 0x63, "POP";
        Alloc = 0xdf, "ALLOC";
        Sys = 0xb4, "SYS";
        Def = 0xcd, "DEF";
    }
}

byte_table! {
    /// Branch conditions taken by `BCC`, tested against vAC
    Cond, VCPU_CONDITION_TABLE {
        Eq = 0x3f, "EQ";
        Ne = 0x72, "NE";
        Gt = 0x4d, "GT";
        Lt = 0x50, "LT";
        Ge = 0x53, "GE";
        Le = 0x56, "LE";
    }
}

/// Mnemonic for an instruction byte, if the translator knows it
pub fn opcode_name(byte: u8) -> Option<&'static str> {
    VCPU_OPCODE_TABLE
        .iter()
        .find(|(b, _)| *b == byte)
        .map(|(_, name)| *name)
}

/// Check that no two table entries share a byte or a name
pub fn verify_opcode_table() -> Result<(), String> {
    for table in [VCPU_OPCODE_TABLE, VCPU_CONDITION_TABLE] {
        for (i, (byte, name)) in table.iter().enumerate() {
            for (other_byte, other_name) in &table[i + 1..] {
                if byte == other_byte {
                    return Err(format!("{} and {} share byte {:02x}", name, other_name, byte));
                }
                if name == other_name {
                    return Err(format!("{} listed twice", name));
                }
            }
        }
    }
    Ok(())
}
