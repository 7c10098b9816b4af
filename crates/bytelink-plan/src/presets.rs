//! Ready-made plans

use crate::error::PlanError;
use crate::plan::DeploymentPlan;
use crate::step::{ArgTemplate, ArgValue, PlanStep};
use bytelink_artifact::{ArtifactSource, LinkReference};

/// Uniswap V3 periphery deployment
pub mod uniswap_v3 {
    /// Wrapped native token
    pub const WETH9: &str = "WETH9";
    pub const FACTORY: &str = "UniswapV3Factory";
    pub const SWAP_ROUTER: &str = "SwapRouter";
    /// Library linked into the position descriptor
    pub const NFT_DESCRIPTOR: &str = "NFTDescriptor";
    pub const POSITION_DESCRIPTOR: &str = "NonfungibleTokenPositionDescriptor";
    pub const POSITION_MANAGER: &str = "NonfungiblePositionManager";

    /// Byte offset of the `NFTDescriptor` placeholder in the descriptor bytecode
    pub const NFT_DESCRIPTOR_LINK_START: usize = 1681;
    pub const NFT_DESCRIPTOR_LINK_LENGTH: usize = 20;

    /// Native currency label passed to the position descriptor
    pub const NATIVE_CURRENCY_LABEL: &str = "ETH";

    /// Every artifact the plan needs
    pub const ARTIFACTS: [&str; 6] = [
        WETH9,
        FACTORY,
        SWAP_ROUTER,
        NFT_DESCRIPTOR,
        POSITION_DESCRIPTOR,
        POSITION_MANAGER,
    ];
}

/// Uniswap V3 plan built from `source`
///
/// Steps, in declaration order: `weth9`, `factory`, `router`,
/// `nft_descriptor_library`, `position_descriptor`, `position_manager`.
/// The position descriptor is linked against `NFTDescriptor` at a fixed
/// offset, replacing whatever references the artifact itself declares.
///
/// # Errors
/// Returns [`PlanError::Artifact`] if `source` lacks one of
/// [`uniswap_v3::ARTIFACTS`]
pub fn uniswap_v3(source: &dyn ArtifactSource) -> Result<DeploymentPlan, PlanError> {
    use self::uniswap_v3::{
        FACTORY, NATIVE_CURRENCY_LABEL, NFT_DESCRIPTOR, NFT_DESCRIPTOR_LINK_LENGTH,
        NFT_DESCRIPTOR_LINK_START, POSITION_DESCRIPTOR, POSITION_MANAGER, SWAP_ROUTER, WETH9,
    };

    let native_label = ArgValue::bytes32_label(NATIVE_CURRENCY_LABEL).ok_or_else(|| {
        PlanError::InvalidArgument {
            step: "position_descriptor".into(),
            reason: "native currency label too long".into(),
        }
    })?;

    DeploymentPlan::new()
        .with_step(PlanStep::new("weth9", source.artifact(WETH9)?))?
        .with_step(PlanStep::new("factory", source.artifact(FACTORY)?))?
        .with_step(
            PlanStep::new("router", source.artifact(SWAP_ROUTER)?).with_args([
                ArgTemplate::address_of("factory"),
                ArgTemplate::address_of("weth9"),
            ]),
        )?
        .with_step(PlanStep::new("nft_descriptor_library", source.artifact(NFT_DESCRIPTOR)?).as_library())?
        .with_step(
            PlanStep::new("position_descriptor", source.artifact(POSITION_DESCRIPTOR)?)
                .with_args([ArgTemplate::address_of("weth9"), native_label.into()])
                .with_link_references(vec![LinkReference::new(
                    NFT_DESCRIPTOR,
                    NFT_DESCRIPTOR_LINK_START,
                    NFT_DESCRIPTOR_LINK_LENGTH,
                )]),
        )?
        .with_step(
            PlanStep::new("position_manager", source.artifact(POSITION_MANAGER)?).with_args([
                ArgTemplate::address_of("factory"),
                ArgTemplate::address_of("weth9"),
                ArgTemplate::address_of("position_descriptor"),
            ]),
        )
}
