//! Binary container for compiled EXP programs.
//!
//! An `.expb` file holds the instruction list of an
//! [`Executable`](../expvm/executable/struct.Executable.html): a four-byte
//! magic, a format version, the instruction count, and one tagged record per
//! instruction. Numbers are little-endian; strings are length-prefixed
//! UTF-8. Labels and function extents are not stored — reading rebuilds them
//! through `Executable::new`, which re-validates the jump targets.

use byteorder::{ReadBytesExt, WriteBytesExt};
use expvm::{Executable, ExecutableError, Instruction, Operand, Type, Value};
use num_derive::{FromPrimitive, ToPrimitive};
use num_traits::{FromPrimitive, ToPrimitive};
use std::fs::File;
use std::io::prelude::*;
use std::io::{BufReader, BufWriter};
use std::path::Path;


pub type Endian = byteorder::LittleEndian;

const MAGIC: [u8; 4] = *b"EXPB";
const VERSION: u16 = 1;

#[derive(Debug)]
pub enum Error {
    Io(std::io::Error),
    BadMagic([u8; 4]),
    UnsupportedVersion(u16),
    InvalidOpcode(u8),
    InvalidValueTag(u8),
    InvalidTypeTag(u8),
    InvalidOperandTag(u8),
    InvalidString(std::string::FromUtf8Error),
    Invalid(ExecutableError),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Error::Io(err) => write!(f, "{}", err),
            Error::BadMagic(magic) => write!(f, "not an EXP program file: magic {:?}", magic),
            Error::UnsupportedVersion(version) => {
                write!(f, "unsupported program file version {}", version)
            }
            Error::InvalidOpcode(tag) => write!(f, "invalid opcode tag {}", tag),
            Error::InvalidValueTag(tag) => write!(f, "invalid value tag {}", tag),
            Error::InvalidTypeTag(tag) => write!(f, "invalid type tag {}", tag),
            Error::InvalidOperandTag(tag) => write!(f, "invalid operand tag {}", tag),
            Error::InvalidString(err) => write!(f, "invalid string data: {}", err),
            Error::Invalid(err) => write!(f, "invalid program: {}", err),
        }
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Error {
        Error::Io(err)
    }
}

impl From<std::string::FromUtf8Error> for Error {
    fn from(err: std::string::FromUtf8Error) -> Error {
        Error::InvalidString(err)
    }
}

impl From<ExecutableError> for Error {
    fn from(err: ExecutableError) -> Error {
        Error::Invalid(err)
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Clone, Copy, Debug, Eq, PartialEq, FromPrimitive, ToPrimitive)]
enum OpTag {
    Alloc,
    Push,
    Pop,
    Load,
    Store,
    Add,
    Sub,
    Mul,
    Div,
    Eq,
    Neq,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
    Cast,
    Print,
    Label,
    Jump,
    JumpIfTrue,
    Call,
    Ret,
    LoadIndex,
    StoreIndex,
    LoadAddr,
    Deref,
    StoreAtAddr,
    Halt,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, FromPrimitive, ToPrimitive)]
enum ValueTag {
    Int,
    Float,
    Bool,
    Str,
    Ref,
    Array,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, FromPrimitive, ToPrimitive)]
enum TypeTag {
    Int,
    Float,
    Bool,
    Str,
    Void,
    Array,
}

pub fn read<R: Read>(reader: &mut R) -> Result<Executable> {
    let mut magic = [0u8; 4];
    reader.read_exact(&mut magic)?;
    if magic != MAGIC {
        return Err(Error::BadMagic(magic));
    }

    let version = reader.read_u16::<Endian>()?;
    if version != VERSION {
        return Err(Error::UnsupportedVersion(version));
    }

    let count = reader.read_u32::<Endian>()?;
    let mut instructions = Vec::with_capacity(count as usize);
    for _ in 0..count {
        instructions.push(read_instruction(reader)?);
    }

    Ok(Executable::new(instructions)?)
}

pub fn write<W: Write>(writer: &mut W, executable: &Executable) -> Result<()> {
    writer.write_all(&MAGIC)?;
    writer.write_u16::<Endian>(VERSION)?;
    writer.write_u32::<Endian>(executable.len() as u32)?;
    for instruction in executable.instructions() {
        write_instruction(writer, instruction)?;
    }
    Ok(())
}

fn read_instruction<R: Read>(reader: &mut R) -> Result<Instruction> {
    let tag = reader.read_u8()?;
    let tag = OpTag::from_u8(tag).ok_or(Error::InvalidOpcode(tag))?;

    Ok(match tag {
        OpTag::Alloc => {
            let name = read_string(reader)?;
            let value = match reader.read_u8()? {
                0 => None,
                _ => Some(read_value(reader)?),
            };
            Instruction::Alloc { name, value }
        }
        OpTag::Push => Instruction::Push(read_value(reader)?),
        OpTag::Pop => Instruction::Pop,
        OpTag::Load => Instruction::Load(read_string(reader)?),
        OpTag::Store => Instruction::Store(read_string(reader)?),
        OpTag::Add => Instruction::Add,
        OpTag::Sub => Instruction::Sub,
        OpTag::Mul => Instruction::Mul,
        OpTag::Div => Instruction::Div,
        OpTag::Eq => Instruction::Eq,
        OpTag::Neq => Instruction::Neq,
        OpTag::Lt => Instruction::Lt,
        OpTag::Le => Instruction::Le,
        OpTag::Gt => Instruction::Gt,
        OpTag::Ge => Instruction::Ge,
        OpTag::And => Instruction::And,
        OpTag::Or => Instruction::Or,
        OpTag::Cast => Instruction::Cast(read_type(reader)?),
        OpTag::Print => Instruction::Print,
        OpTag::Label => Instruction::Label(read_string(reader)?),
        OpTag::Jump => Instruction::Jump(read_string(reader)?),
        OpTag::JumpIfTrue => Instruction::JumpIfTrue(read_string(reader)?),
        OpTag::Call => Instruction::Call(read_string(reader)?),
        OpTag::Ret => Instruction::Ret,
        OpTag::LoadIndex => Instruction::LoadIndex {
            array: read_string(reader)?,
            index: read_operand(reader)?,
        },
        OpTag::StoreIndex => Instruction::StoreIndex {
            array: read_string(reader)?,
            index: read_operand(reader)?,
        },
        OpTag::LoadAddr => Instruction::LoadAddr(read_string(reader)?),
        OpTag::Deref => Instruction::Deref,
        OpTag::StoreAtAddr => Instruction::StoreAtAddr,
        OpTag::Halt => Instruction::Halt,
    })
}

fn write_instruction<W: Write>(writer: &mut W, instruction: &Instruction) -> Result<()> {
    writer.write_u8(op_tag(instruction).to_u8().unwrap())?;

    match instruction {
        Instruction::Alloc { name, value } => {
            write_string(writer, name)?;
            match value {
                None => writer.write_u8(0)?,
                Some(value) => {
                    writer.write_u8(1)?;
                    write_value(writer, value)?;
                }
            }
        }
        Instruction::Push(value) => write_value(writer, value)?,
        Instruction::Load(name)
        | Instruction::Store(name)
        | Instruction::Label(name)
        | Instruction::Jump(name)
        | Instruction::JumpIfTrue(name)
        | Instruction::Call(name)
        | Instruction::LoadAddr(name) => write_string(writer, name)?,
        Instruction::Cast(target) => write_type(writer, target)?,
        Instruction::LoadIndex { array, index } | Instruction::StoreIndex { array, index } => {
            write_string(writer, array)?;
            write_operand(writer, index)?;
        }
        _ => {}
    }
    Ok(())
}

fn op_tag(instruction: &Instruction) -> OpTag {
    match instruction {
        Instruction::Alloc { .. } => OpTag::Alloc,
        Instruction::Push(_) => OpTag::Push,
        Instruction::Pop => OpTag::Pop,
        Instruction::Load(_) => OpTag::Load,
        Instruction::Store(_) => OpTag::Store,
        Instruction::Add => OpTag::Add,
        Instruction::Sub => OpTag::Sub,
        Instruction::Mul => OpTag::Mul,
        Instruction::Div => OpTag::Div,
        Instruction::Eq => OpTag::Eq,
        Instruction::Neq => OpTag::Neq,
        Instruction::Lt => OpTag::Lt,
        Instruction::Le => OpTag::Le,
        Instruction::Gt => OpTag::Gt,
        Instruction::Ge => OpTag::Ge,
        Instruction::And => OpTag::And,
        Instruction::Or => OpTag::Or,
        Instruction::Cast(_) => OpTag::Cast,
        Instruction::Print => OpTag::Print,
        Instruction::Label(_) => OpTag::Label,
        Instruction::Jump(_) => OpTag::Jump,
        Instruction::JumpIfTrue(_) => OpTag::JumpIfTrue,
        Instruction::Call(_) => OpTag::Call,
        Instruction::Ret => OpTag::Ret,
        Instruction::LoadIndex { .. } => OpTag::LoadIndex,
        Instruction::StoreIndex { .. } => OpTag::StoreIndex,
        Instruction::LoadAddr(_) => OpTag::LoadAddr,
        Instruction::Deref => OpTag::Deref,
        Instruction::StoreAtAddr => OpTag::StoreAtAddr,
        Instruction::Halt => OpTag::Halt,
    }
}

fn read_value<R: Read>(reader: &mut R) -> Result<Value> {
    let tag = reader.read_u8()?;
    let tag = ValueTag::from_u8(tag).ok_or(Error::InvalidValueTag(tag))?;

    Ok(match tag {
        ValueTag::Int => Value::Int(reader.read_i64::<Endian>()?),
        ValueTag::Float => Value::Float(reader.read_f64::<Endian>()?),
        ValueTag::Bool => Value::Bool(reader.read_u8()? != 0),
        ValueTag::Str => Value::Str(read_string(reader)?),
        ValueTag::Ref => Value::Ref(read_string(reader)?),
        ValueTag::Array => {
            let len = reader.read_u32::<Endian>()?;
            let mut elements = Vec::with_capacity(len as usize);
            for _ in 0..len {
                elements.push(read_value(reader)?);
            }
            Value::Array(elements)
        }
    })
}

fn write_value<W: Write>(writer: &mut W, value: &Value) -> Result<()> {
    match value {
        Value::Int(i) => {
            writer.write_u8(ValueTag::Int.to_u8().unwrap())?;
            writer.write_i64::<Endian>(*i)?;
        }
        Value::Float(x) => {
            writer.write_u8(ValueTag::Float.to_u8().unwrap())?;
            writer.write_f64::<Endian>(*x)?;
        }
        Value::Bool(b) => {
            writer.write_u8(ValueTag::Bool.to_u8().unwrap())?;
            writer.write_u8(*b as u8)?;
        }
        Value::Str(s) => {
            writer.write_u8(ValueTag::Str.to_u8().unwrap())?;
            write_string(writer, s)?;
        }
        Value::Ref(name) => {
            writer.write_u8(ValueTag::Ref.to_u8().unwrap())?;
            write_string(writer, name)?;
        }
        Value::Array(elements) => {
            writer.write_u8(ValueTag::Array.to_u8().unwrap())?;
            writer.write_u32::<Endian>(elements.len() as u32)?;
            for element in elements {
                write_value(writer, element)?;
            }
        }
    }
    Ok(())
}

fn read_type<R: Read>(reader: &mut R) -> Result<Type> {
    let tag = reader.read_u8()?;
    let tag = TypeTag::from_u8(tag).ok_or(Error::InvalidTypeTag(tag))?;

    Ok(match tag {
        TypeTag::Int => Type::Int,
        TypeTag::Float => Type::Float,
        TypeTag::Bool => Type::Bool,
        TypeTag::Str => Type::Str,
        TypeTag::Void => Type::Void,
        TypeTag::Array => Type::Array(Box::new(read_type(reader)?)),
    })
}

fn write_type<W: Write>(writer: &mut W, ty: &Type) -> Result<()> {
    match ty {
        Type::Int => writer.write_u8(TypeTag::Int.to_u8().unwrap())?,
        Type::Float => writer.write_u8(TypeTag::Float.to_u8().unwrap())?,
        Type::Bool => writer.write_u8(TypeTag::Bool.to_u8().unwrap())?,
        Type::Str => writer.write_u8(TypeTag::Str.to_u8().unwrap())?,
        Type::Void => writer.write_u8(TypeTag::Void.to_u8().unwrap())?,
        Type::Array(elem) => {
            writer.write_u8(TypeTag::Array.to_u8().unwrap())?;
            write_type(writer, elem)?;
        }
    }
    Ok(())
}

fn read_operand<R: Read>(reader: &mut R) -> Result<Operand> {
    let tag = reader.read_u8()?;
    match tag {
        0 => Ok(Operand::Name(read_string(reader)?)),
        1 => Ok(Operand::Const(read_value(reader)?)),
        _ => Err(Error::InvalidOperandTag(tag)),
    }
}

fn write_operand<W: Write>(writer: &mut W, operand: &Operand) -> Result<()> {
    match operand {
        Operand::Name(name) => {
            writer.write_u8(0)?;
            write_string(writer, name)?;
        }
        Operand::Const(value) => {
            writer.write_u8(1)?;
            write_value(writer, value)?;
        }
    }
    Ok(())
}

fn read_string<R: Read>(reader: &mut R) -> Result<String> {
    let len = reader.read_u32::<Endian>()?;
    let mut bytes = vec![0; len as usize];
    reader.read_exact(&mut bytes)?;
    Ok(String::from_utf8(bytes)?)
}

fn write_string<W: Write>(writer: &mut W, s: &str) -> Result<()> {
    writer.write_u32::<Endian>(s.len() as u32)?;
    writer.write_all(s.as_bytes())?;
    Ok(())
}

pub trait ReadExpExt: Read + Sized {
    fn read_exp(&mut self) -> Result<Executable> {
        read(self)
    }
}

impl<R: Read + Sized> ReadExpExt for R {}

pub trait WriteExpExt: Write + Sized {
    fn write_exp(&mut self, executable: &Executable) -> Result<()> {
        write(self, executable)
    }
}

impl<W: Write + Sized> WriteExpExt for W {}

pub fn read_file<P: AsRef<Path>>(path: P) -> Result<Executable> {
    BufReader::new(File::open(path)?).read_exp()
}

pub fn write_file<P: AsRef<Path>>(path: P, executable: &Executable) -> Result<()> {
    BufWriter::new(File::create(path)?).write_exp(executable)
}
