/// Implement [`Typed`](crate::Typed) for a field-less enum, mapped as its integral value.
///
/// Name the enum, its representation, and every variant. Values outside the listed variants
/// fail to decode.
///
/// # Example
/// ```rust
/// # use jsonmap::*;
/// #[derive(Debug, PartialEq)]
/// #[repr(u8)]
/// enum Planet {
///     Mercury = 1,
///     Venus = 2,
/// }
///
/// typed_enum!(Planet as u8 { Mercury, Venus });
///
/// let mapper = Mapper::new();
/// assert_eq!(mapper.to_json(&Planet::Venus).unwrap(), "2");
/// assert_eq!(mapper.from_json::<Planet>("1").unwrap(), Planet::Mercury);
/// assert!(mapper.from_json::<Planet>("3").is_err());
/// ```
#[macro_export]
macro_rules! typed_enum {
    ($ty:ident as $repr:ty { $( $variant:ident ),+ $(,)? }) => {
	impl $crate::reflect::Typed for $ty {
	    fn type_info() -> $crate::reflect::TypeInfo {
		$crate::reflect::TypeInfo::Enum($crate::reflect::EnumInfo {
		    unsigned: <$repr as $crate::reflect::EnumRepr>::UNSIGNED,
		    from_bits: |bits| {
			$(
			if bits == $ty::$variant as $repr as i128 {
			    return Some(Box::new($ty::$variant) as Box<dyn $crate::reflect::Reflect>);
			}
			)+
			None
		    },
		})
	    }

	    fn view(&self) -> $crate::reflect::ReflectRef<'_> {
		let bits = match self {
		    $( $ty::$variant => $ty::$variant as $repr as i128, )+
		};
		$crate::reflect::ReflectRef::Enum {
		    bits,
		    unsigned: <$repr as $crate::reflect::EnumRepr>::UNSIGNED,
		}
	    }
	}
    };
}

/// Implement [`Typed`](crate::Typed) for a `bitflags` type, mapped as its bits.
///
/// Any combination of known flags decodes; unknown bits fail.
///
/// # Example
/// ```rust
/// # use jsonmap::*;
/// use bitflags::bitflags;
///
/// bitflags! {
///     struct Perms: u32 {
///         const READ = 1;
///         const WRITE = 8;
///     }
/// }
///
/// typed_flags!(Perms as u32);
///
/// let mapper = Mapper::new();
/// assert_eq!(mapper.from_json::<Perms>("9").unwrap(), Perms::READ | Perms::WRITE);
/// assert_eq!(mapper.to_json(&Perms::WRITE).unwrap(), "8");
/// ```
#[macro_export]
macro_rules! typed_flags {
    ($ty:ident as $repr:ty) => {
	impl $crate::reflect::Typed for $ty {
	    fn type_info() -> $crate::reflect::TypeInfo {
		$crate::reflect::TypeInfo::Enum($crate::reflect::EnumInfo {
		    unsigned: <$repr as $crate::reflect::EnumRepr>::UNSIGNED,
		    from_bits: |bits| {
			let bits = <$repr as ::core::convert::TryFrom<i128>>::try_from(bits).ok()?;
			$ty::from_bits(bits).map(|f| Box::new(f) as Box<dyn $crate::reflect::Reflect>)
		    },
		})
	    }

	    fn view(&self) -> $crate::reflect::ReflectRef<'_> {
		$crate::reflect::ReflectRef::Enum {
		    bits: self.bits() as i128,
		    unsigned: <$repr as $crate::reflect::EnumRepr>::UNSIGNED,
		}
	    }
	}
    };
}
