// Copyright (c) Glisk Labs
// SPDX-License-Identifier: Apache-2.0

//! Minimal ABI fragment for the GliskNFT contract — only the functions
//! and events this service calls. Synced by hand against the deployed
//! contract's interface; a full build-artifact ABI is not needed since
//! `ethers::contract::abigen!` only requires the fragments it uses.

use ethers::prelude::abigen;

abigen!(
    GliskNft,
    r#"[
        function nextTokenId() external view returns (uint256)
        function tokenPromptAuthor(uint256 tokenId) external view returns (address)
        function isRevealed(uint256 tokenId) external view returns (bool)
        function tokenURI(uint256 tokenId) external view returns (string)
        function revealTokens(uint256[] tokenIds, string[] uris) external
        event BatchMinted(address indexed minter, address indexed promptAuthor, uint256 indexed startTokenId, uint256 quantity, uint256 totalPaid)
    ]"#,
);
