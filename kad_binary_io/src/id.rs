use std::convert::TryInto;

use nom::bytes::complete::take;
use nom::combinator::{map, map_opt};

use kad_id::{Id, ID_SIZE};

use super::*;

impl FromBytes for Id {
    fn from_bytes(input: &[u8]) -> IResult<&[u8], Self> {
        map(map_opt(take(ID_SIZE), |id: &[u8]| id.try_into().ok()), |id: [u8; ID_SIZE]| id.into())(input)
    }
}

impl ToBytes for Id {
    fn to_bytes<'a>(&self, buf: (&'a mut [u8], usize)) -> Result<(&'a mut [u8], usize), GenError> {
        do_gen!(buf,
            gen_slice!(self.as_ref())
        )
    }
}
